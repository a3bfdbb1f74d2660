use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::core::params::DetectionParams;
use crate::core::vectorize::{ResolvedMask, VectorFeatureCollection, VectorSummary};

/// Prefix of metadata items embedded in the output GeoTIFF.
pub const METADATA_PREFIX: &str = "LAKEPRO_";

/// Metadata items describing a run, for embedding in the lake raster.
pub fn lake_metadata_items(
    params: &DetectionParams,
    mask: &ResolvedMask,
    vectors: &VectorFeatureCollection,
    properties: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut items = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        items.insert(format!("{}{}", METADATA_PREFIX, key), value);
    };
    put("VERSION", env!("CARGO_PKG_VERSION").to_string());
    put("LAKE_BAND", params.lake_band_name.clone());
    put("RESOLUTION", mask.resolution.to_string());
    put("COARSENING", mask.coarsening.to_string());
    put("CONNECTIVITY", params.vectorize.connectivity.to_string());
    put("MODE", params.vectorize.mode.to_string());
    put("NDWI_THRESHOLD", params.water.ndwi_threshold.to_string());
    put("GREEN_RED_MARGIN", params.water.green_red_margin.to_string());
    put("CLOUD_MASK", params.cloud.enabled.to_string());
    put("SURFACE_MASK", params.surface.enabled.to_string());
    put("LAKE_PIXELS", mask.lake_count().to_string());
    put("FEATURES", vectors.len().to_string());
    // carry a few acquisition identifiers through when the source had them
    for key in ["SPACECRAFT_NAME", "PRODUCT_START_TIME", "DATATAKE_1_DATATAKE_SENSING_START"] {
        if let Some(v) = properties.get(key) {
            put(&format!("SOURCE_{}", key), v.clone());
        }
    }
    items
}

/// JSON sidecar describing one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSidecar<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub generated: String,
    pub input: String,
    pub roi: String,
    pub target_crs: &'a str,
    pub raster: RasterSummary,
    pub vectors: VectorSummary,
    pub params: &'a DetectionParams,
    pub source_properties: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RasterSummary {
    pub crs: String,
    pub rows: usize,
    pub cols: usize,
    pub resolution: f64,
    pub coarsening: usize,
    pub geotransform: [f64; 6],
    /// min_x, min_y, max_x, max_y
    pub bounds: (f64, f64, f64, f64),
    pub lake_pixels: usize,
}

impl<'a> RunSidecar<'a> {
    pub fn new(
        input: &Path,
        roi: &Path,
        params: &'a DetectionParams,
        mask: &ResolvedMask,
        vectors: &VectorFeatureCollection,
        source_properties: &'a BTreeMap<String, String>,
    ) -> Self {
        let (rows, cols) = mask.shape();
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            generated: chrono::Utc::now().to_rfc3339(),
            input: input.display().to_string(),
            roi: roi.display().to_string(),
            target_crs: &params.vectorize.target_crs,
            raster: RasterSummary {
                crs: mask.crs.clone(),
                rows,
                cols,
                resolution: mask.resolution,
                coarsening: mask.coarsening,
                geotransform: mask.geotransform.to_gdal(),
                bounds: mask.geotransform.bounds(cols, rows),
                lake_pixels: mask.lake_count(),
            },
            vectors: vectors.summary(),
            params,
            source_properties,
        }
    }

    pub fn write(&self, output: &Path) -> crate::Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        std::fs::write(output, json_string)?;
        info!("Created run sidecar: {:?}", output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use ndarray::Array2;

    fn mask() -> ResolvedMask {
        ResolvedMask {
            grid: Array2::from_shape_fn((3, 3), |(r, c)| r == c),
            geotransform: GeoTransform::new(0.0, 30.0, 10.0, -10.0),
            crs: "EPSG:32633".to_string(),
            resolution: 10.0,
            coarsening: 1,
        }
    }

    fn vectors() -> VectorFeatureCollection {
        VectorFeatureCollection {
            crs: "EPSG:32633".to_string(),
            features: vec![],
        }
    }

    #[test]
    fn items_are_prefixed() {
        let params = DetectionParams::default();
        let mut props = BTreeMap::new();
        props.insert("SPACECRAFT_NAME".to_string(), "Sentinel-2A".to_string());
        let items = lake_metadata_items(&params, &mask(), &vectors(), &props);
        assert!(items.keys().all(|k| k.starts_with(METADATA_PREFIX)));
        assert_eq!(items["LAKEPRO_LAKE_PIXELS"], "3");
        assert_eq!(items["LAKEPRO_SOURCE_SPACECRAFT_NAME"], "Sentinel-2A");
    }

    #[test]
    fn sidecar_serializes_params_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.json");
        let params = DetectionParams::default();
        let props = BTreeMap::new();
        let (m, v) = (mask(), vectors());
        RunSidecar::new(Path::new("img.tif"), Path::new("roi.geojson"), &params, &m, &v, &props)
            .write(&out)
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["tool"], "lakepro");
        assert_eq!(value["raster"]["lake_pixels"], 3);
        assert_eq!(value["raster"]["bounds"][3], 30.0);
        assert_eq!(value["vectors"]["features"], 0);
        assert_eq!(value["params"]["water"]["ndwi_threshold"], 0.18);
    }
}
