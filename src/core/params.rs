use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BandRole, Connectivity, VectorizeMode};

/// Maps logical band roles onto the identifiers used by the source platform.
/// Defaults follow Sentinel-2 MSI naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandMap {
    pub blue: String,
    pub green: String,
    pub red: String,
    pub swir: String,
    pub cirrus: String,
}

impl BandMap {
    pub fn name(&self, role: BandRole) -> &str {
        match role {
            BandRole::Blue => &self.blue,
            BandRole::Green => &self.green,
            BandRole::Red => &self.red,
            BandRole::Swir => &self.swir,
            BandRole::Cirrus => &self.cirrus,
        }
    }
}

impl Default for BandMap {
    fn default() -> Self {
        Self {
            blue: "B2".to_string(),
            green: "B3".to_string(),
            red: "B4".to_string(),
            swir: "B11".to_string(),
            cirrus: "B10".to_string(),
        }
    }
}

/// Two-band cloud test: `swir > swir_threshold AND cirrus > cirrus_threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    pub enabled: bool,
    pub swir_threshold: f64,
    pub cirrus_threshold: f64,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            enabled: true,
            swir_threshold: 0.1,
            cirrus_threshold: 0.01,
        }
    }
}

/// Rock/ice/ocean test: `nd(green, swir) < index_threshold AND blue < blue_ceiling`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceParams {
    pub enabled: bool,
    pub index_threshold: f64,
    pub blue_ceiling: f64,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            enabled: true,
            index_threshold: 0.85,
            blue_ceiling: 0.4,
        }
    }
}

/// Lake test: `nd(blue, red) > ndwi_threshold AND green - red > green_red_margin`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    pub ndwi_threshold: f64,
    pub green_red_margin: f64,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            ndwi_threshold: 0.18,
            green_red_margin: 0.09,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeParams {
    /// Output pixel size in units of the mask CRS
    pub resolution: f64,
    /// CRS of the delivered raster and vectors
    pub target_crs: String,
    pub connectivity: Connectivity,
    pub mode: VectorizeMode,
    /// Edge length of the square tiles labeled in parallel
    pub tile_size: usize,
    /// Pixel budget for the ROI window at the working resolution
    pub max_pixels: u64,
    /// Largest resolution multiplier best-effort mode may apply
    pub max_coarsening: usize,
    /// Douglas-Peucker tolerance in pixels (approximate mode only)
    pub simplify_tolerance: f64,
    /// Allowed relative area drift of a simplified feature
    pub area_tolerance: f64,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self {
            resolution: 10.0,
            target_crs: "EPSG:4326".to_string(),
            connectivity: Connectivity::Eight,
            mode: VectorizeMode::Approximate,
            tile_size: 256,
            max_pixels: 10_000_000_000,
            max_coarsening: 16,
            simplify_tolerance: 0.5,
            area_tolerance: 0.02,
        }
    }
}

/// Detection parameters suitable for config files and CLI overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Divisor turning digital numbers into reflectance
    pub scale_factor: f64,
    pub bands: BandMap,
    pub cloud: CloudParams,
    pub surface: SurfaceParams,
    pub water: WaterParams,
    /// Name under which the lake band is merged into the image
    pub lake_band_name: String,
    pub vectorize: VectorizeParams,
    /// Which candidate image to run on when several are offered
    pub image_index: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 10_000.0,
            bands: BandMap::default(),
            cloud: CloudParams::default(),
            surface: SurfaceParams::default(),
            water: WaterParams::default(),
            lake_band_name: "LakeMask".to_string(),
            vectorize: VectorizeParams::default(),
            image_index: 0,
        }
    }
}

fn finite(arg: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        })
    }
}

fn positive(arg: &'static str, value: f64) -> Result<()> {
    finite(arg, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        })
    }
}

impl DetectionParams {
    /// Load parameters from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: DetectionParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Band roles the enabled stages will read.
    pub fn required_roles(&self) -> Vec<BandRole> {
        let mut roles = vec![BandRole::Blue, BandRole::Green, BandRole::Red];
        if self.cloud.enabled || self.surface.enabled {
            roles.push(BandRole::Swir);
        }
        if self.cloud.enabled {
            roles.push(BandRole::Cirrus);
        }
        roles
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        positive("scale_factor", self.scale_factor)?;
        finite("cloud.swir_threshold", self.cloud.swir_threshold)?;
        finite("cloud.cirrus_threshold", self.cloud.cirrus_threshold)?;
        finite("surface.index_threshold", self.surface.index_threshold)?;
        finite("surface.blue_ceiling", self.surface.blue_ceiling)?;
        finite("water.ndwi_threshold", self.water.ndwi_threshold)?;
        finite("water.green_red_margin", self.water.green_red_margin)?;
        positive("vectorize.resolution", self.vectorize.resolution)?;
        finite("vectorize.simplify_tolerance", self.vectorize.simplify_tolerance)?;
        if self.vectorize.simplify_tolerance < 0.0 {
            return Err(Error::InvalidArgument {
                arg: "vectorize.simplify_tolerance",
                value: self.vectorize.simplify_tolerance.to_string(),
            });
        }
        finite("vectorize.area_tolerance", self.vectorize.area_tolerance)?;
        if !(0.0..1.0).contains(&self.vectorize.area_tolerance) {
            return Err(Error::InvalidArgument {
                arg: "vectorize.area_tolerance",
                value: self.vectorize.area_tolerance.to_string(),
            });
        }
        if self.vectorize.tile_size == 0 {
            return Err(Error::InvalidArgument {
                arg: "vectorize.tile_size",
                value: "0".to_string(),
            });
        }
        if self.vectorize.max_pixels == 0 {
            return Err(Error::InvalidArgument {
                arg: "vectorize.max_pixels",
                value: "0".to_string(),
            });
        }
        if self.vectorize.max_coarsening == 0 {
            return Err(Error::InvalidArgument {
                arg: "vectorize.max_coarsening",
                value: "0".to_string(),
            });
        }
        if self.vectorize.target_crs.trim().is_empty() {
            return Err(Error::InvalidArgument {
                arg: "vectorize.target_crs",
                value: self.vectorize.target_crs.clone(),
            });
        }
        if self.lake_band_name.trim().is_empty() {
            return Err(Error::InvalidArgument {
                arg: "lake_band_name",
                value: self.lake_band_name.clone(),
            });
        }

        let roles = self.required_roles();
        for (i, role) in roles.iter().enumerate() {
            let name = self.bands.name(*role);
            if name.trim().is_empty() {
                return Err(Error::InvalidArgument {
                    arg: "bands",
                    value: format!("{} has an empty name", role),
                });
            }
            if name == self.lake_band_name {
                return Err(Error::BandNameCollision {
                    name: name.to_string(),
                });
            }
            if roles[..i].iter().any(|r| self.bands.name(*r) == name) {
                return Err(Error::InvalidArgument {
                    arg: "bands",
                    value: format!("`{}` assigned to more than one role", name),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = DetectionParams::default();
        params.validate().unwrap();
        assert_eq!(params.bands.name(BandRole::Cirrus), "B10");
        assert_eq!(params.vectorize.connectivity, Connectivity::Eight);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "water": { "ndwi_threshold": 0.25 }, "vectorize": { "connectivity": "four" } }"#;
        let params: DetectionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.water.ndwi_threshold, 0.25);
        assert_eq!(params.water.green_red_margin, 0.09);
        assert_eq!(params.vectorize.connectivity, Connectivity::Four);
        assert_eq!(params.vectorize.resolution, 10.0);
        assert_eq!(params.scale_factor, 10_000.0);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let mut params = DetectionParams::default();
        params.vectorize.mode = VectorizeMode::Exact;
        std::fs::write(&path, serde_json::to_string_pretty(&params).unwrap()).unwrap();
        let loaded = DetectionParams::from_json_file(&path).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn zero_scale_factor_is_rejected() {
        let params = DetectionParams {
            scale_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidArgument { arg: "scale_factor", .. })
        ));
    }

    #[test]
    fn lake_band_name_colliding_with_input_band_is_rejected() {
        let params = DetectionParams {
            lake_band_name: "B3".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(Error::BandNameCollision { .. })
        ));
    }

    #[test]
    fn duplicate_role_names_are_rejected() {
        let mut params = DetectionParams::default();
        params.bands.red = "B2".to_string();
        assert!(params.validate().is_err());
    }

    #[test]
    fn cirrus_not_required_without_cloud_masking() {
        let mut params = DetectionParams::default();
        params.cloud.enabled = false;
        assert!(!params.required_roles().contains(&BandRole::Cirrus));
        assert!(params.required_roles().contains(&BandRole::Swir));
    }
}
