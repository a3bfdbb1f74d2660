use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::Array2;

use super::geotransform::GeoTransform;
use super::lake::LakeMask;
use super::mask::Mask;
use crate::core::params::BandMap;
use crate::error::{Error, Result};
use crate::types::BandRole;

/// Multiband raster on a single grid.
///
/// Bands are shared behind `Arc`, so stages that only touch validity hand the sample
/// data through without copying. Every stage returns a new image.
#[derive(Debug, Clone)]
pub struct RasterImage {
    rows: usize,
    cols: usize,
    geotransform: GeoTransform,
    crs: String,
    bands: BTreeMap<String, Arc<Array2<f64>>>,
    lake_bands: BTreeMap<String, Arc<LakeMask>>,
    valid: Mask,
    properties: BTreeMap<String, String>,
}

impl RasterImage {
    /// Build an image from named bands; names must be unique and shapes identical.
    pub fn new(
        geotransform: GeoTransform,
        crs: impl Into<String>,
        bands: Vec<(String, Array2<f64>)>,
    ) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::Processing("image has no bands".to_string()))?;
        let (rows, cols) = first.1.dim();
        let mut map = BTreeMap::new();
        for (name, data) in bands {
            if data.dim() != (rows, cols) {
                return Err(Error::ShapeMismatch {
                    band: name,
                    expected: (rows, cols),
                    actual: data.dim(),
                });
            }
            if map.contains_key(&name) {
                return Err(Error::BandNameCollision { name });
            }
            map.insert(name, Arc::new(data));
        }
        Ok(Self {
            rows,
            cols,
            geotransform,
            crs: crs.into(),
            bands: map,
            lake_bands: BTreeMap::new(),
            valid: Mask::all_valid((rows, cols)),
            properties: BTreeMap::new(),
        })
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Replace the validity mask; used for no-data read from the source.
    pub fn with_valid(&self, valid: Mask) -> Result<Self> {
        if valid.shape() != self.shape() {
            return Err(Error::ShapeMismatch {
                band: "validity".to_string(),
                expected: self.shape(),
                actual: valid.shape(),
            });
        }
        Ok(Self {
            valid,
            ..self.clone()
        })
    }

    /// New image with `f` applied to every sample band.
    pub fn map_bands(&self, f: impl Fn(&Array2<f64>) -> Array2<f64>) -> Self {
        let bands = self
            .bands
            .iter()
            .map(|(name, data)| (name.clone(), Arc::new(f(data))))
            .collect();
        Self {
            bands,
            ..self.clone()
        }
    }

    /// New image with the lake band merged in under `name`.
    pub fn with_lake_band(&self, name: &str, lake: LakeMask) -> Result<Self> {
        if self.has_band(name) {
            return Err(Error::BandNameCollision {
                name: name.to_string(),
            });
        }
        if lake.shape() != self.shape() {
            return Err(Error::ShapeMismatch {
                band: name.to_string(),
                expected: self.shape(),
                actual: lake.shape(),
            });
        }
        let mut out = self.clone();
        out.lake_bands.insert(name.to_string(), Arc::new(lake));
        Ok(out)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn geotransform(&self) -> &GeoTransform {
        &self.geotransform
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn valid(&self) -> &Mask {
        &self.valid
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name) || self.lake_bands.contains_key(name)
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands
            .keys()
            .chain(self.lake_bands.keys())
            .map(String::as_str)
    }

    pub fn band(&self, name: &str) -> Option<&Array2<f64>> {
        self.bands.get(name).map(|b| b.as_ref())
    }

    /// Checked lookup of the band playing `role`.
    pub fn role_band(&self, map: &BandMap, role: BandRole) -> Result<&Array2<f64>> {
        let name = map.name(role);
        self.band(name).ok_or_else(|| Error::MissingBand {
            role: role.to_string(),
            band: name.to_string(),
        })
    }

    pub fn lake_band(&self, name: &str) -> Option<&LakeMask> {
        self.lake_bands.get(name).map(|b| b.as_ref())
    }
}

/// CRS identifiers compare case-insensitively after trimming (`epsg:4326` == `EPSG:4326`).
pub fn same_crs(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::Classification;

    fn band(v: f64) -> Array2<f64> {
        Array2::from_elem((3, 4), v)
    }

    #[test]
    fn rejects_mismatched_band_shapes() {
        let err = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![("B2".into(), band(1.0)), ("B3".into(), Array2::zeros((4, 4)))],
        )
        .unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn role_lookup_reports_missing_band() {
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![("B2".into(), band(1.0))],
        )
        .unwrap();
        let map = BandMap::default();
        assert!(img.role_band(&map, BandRole::Blue).is_ok());
        match img.role_band(&map, BandRole::Green) {
            Err(Error::MissingBand { band, .. }) => assert_eq!(band, "B3"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn lake_band_name_collision() {
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![("B2".into(), band(1.0))],
        )
        .unwrap();
        let lake = LakeMask::new(Array2::from_elem((3, 4), Classification::NonLake));
        let merged = img.with_lake_band("LakeMask", lake.clone()).unwrap();
        assert!(merged.lake_band("LakeMask").is_some());
        assert!(img.lake_band("LakeMask").is_none());
        assert!(matches!(
            merged.with_lake_band("LakeMask", lake.clone()),
            Err(Error::BandNameCollision { .. })
        ));
        assert!(matches!(
            img.with_lake_band("B2", lake),
            Err(Error::BandNameCollision { .. })
        ));
    }

    #[test]
    fn crs_comparison_ignores_case() {
        assert!(same_crs("epsg:4326", " EPSG:4326"));
        assert!(!same_crs("EPSG:4326", "EPSG:32633"));
    }
}
