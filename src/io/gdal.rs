use gdal::raster::ResampleAlg;
use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::{Array2, Zip};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::raster::{GeoTransform, Mask, RasterImage};
use crate::error::{Error as LakeError, Result as LakeResult};

/// Errors encountered when using GDAL reader
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),
    #[error("gdalwarp failed: {0}")]
    Warp(String),
}

/// Metadata extracted from a GDAL-supported dataset
#[derive(Debug, Clone)]
pub struct GdalMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
    pub geotransform: [f64; 6],
    /// Projection as `EPSG:XXXX` when an authority code is present, WKT otherwise
    pub projection: String,
    /// Per-band descriptions, empty when unset
    pub band_descriptions: Vec<String>,
    /// Per-band no-data values
    pub nodata: Vec<Option<f64>>,
    /// Dataset metadata key-value pairs (default domain)
    pub metadata: BTreeMap<String, String>,
}

/// Reader for multiband optical rasters via GDAL
pub struct GdalImageReader {
    pub dataset: Dataset,
    pub metadata: GdalMetadata,
}

// Helper to extract EPSG code from WKT authority tag
pub(crate) fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    if let Some(idx) = wkt.rfind(KEY) {
        let start = idx + KEY.len();
        if let Some(end) = wkt[start..].find('"') {
            let code = &wkt[start..start + end];
            return Some(format!("EPSG:{}", code));
        }
    }
    None
}

/// Normalize a projection string to `EPSG:XXXX` when possible.
pub(crate) fn normalize_crs(proj: &str) -> String {
    if proj.starts_with("EPSG:") {
        proj.to_string()
    } else if let Some(code) = parse_epsg(proj) {
        code
    } else {
        proj.to_string()
    }
}

impl GdalImageReader {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF, JP2, VRT)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(_) => {
                warn!("No geotransform in {:?}; using pixel grid", path.as_ref());
                GeoTransform::default().to_gdal()
            }
        };
        let projection = normalize_crs(&dataset.projection());

        let mut band_descriptions = Vec::with_capacity(bands);
        let mut nodata = Vec::with_capacity(bands);
        for idx in 1..=bands {
            let band = dataset.rasterband(idx)?;
            band_descriptions.push(band.description().unwrap_or_default().trim().to_string());
            nodata.push(band.no_data_value());
        }

        // Collect metadata entries (domain "")
        let mut metadata_map = BTreeMap::new();
        if let Some(entries) = dataset.metadata_domain("") {
            for entry in entries {
                if let Some((key, val)) = entry.split_once('=') {
                    metadata_map.insert(key.to_string(), val.to_string());
                }
            }
        }
        Ok(GdalImageReader {
            dataset,
            metadata: GdalMetadata {
                size_x,
                size_y,
                bands,
                geotransform,
                projection,
                band_descriptions,
                nodata,
                metadata: metadata_map,
            },
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (height, width)
    pub fn read_band(
        &self,
        index: usize,
        e_resample_alg: Option<ResampleAlg>,
    ) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, e_resample_alg)?;
        let data_vec = buf.data().to_vec();
        let len = data_vec.len();
        Array2::from_shape_vec((self.metadata.size_y, self.metadata.size_x), data_vec).map_err(
            |_| {
                GdalError::DimensionMismatch(
                    self.metadata.size_x,
                    self.metadata.size_y,
                    len,
                    1,
                )
            },
        )
    }

    /// Band names in file order: `overrides` when given, else band descriptions, else `B<n>`.
    pub fn band_names(&self, overrides: Option<&[String]>) -> LakeResult<Vec<String>> {
        if let Some(names) = overrides {
            if names.len() != self.metadata.bands {
                return Err(LakeError::InvalidArgument {
                    arg: "band_names",
                    value: format!(
                        "{} names for {} bands",
                        names.len(),
                        self.metadata.bands
                    ),
                });
            }
            return Ok(names.iter().map(|n| n.trim().to_string()).collect());
        }
        Ok(self
            .metadata
            .band_descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| {
                if d.is_empty() {
                    format!("B{}", i + 1)
                } else {
                    d.clone()
                }
            })
            .collect())
    }

    /// Read every band into a `RasterImage`. Pixels equal to a band's no-data value
    /// (or non-finite) start out invalid.
    pub fn read_image(&self, band_name_overrides: Option<&[String]>) -> LakeResult<RasterImage> {
        let names = self.band_names(band_name_overrides)?;
        let shape = (self.metadata.size_y, self.metadata.size_x);
        let mut valid = Array2::from_elem(shape, true);
        let mut bands = Vec::with_capacity(names.len());
        for (idx, name) in names.into_iter().enumerate() {
            let data = self.read_band(idx + 1, Some(ResampleAlg::NearestNeighbour))?;
            let nodata = self.metadata.nodata[idx];
            Zip::from(&mut valid).and(&data).par_for_each(|v, &x| {
                if !x.is_finite() || nodata.is_some_and(|nd| x == nd) {
                    *v = false;
                }
            });
            debug!("Read band {} as `{}`", idx + 1, name);
            bands.push((name, data));
        }
        let gt = GeoTransform::from_gdal(self.metadata.geotransform);
        let image = RasterImage::new(gt, self.metadata.projection.clone(), bands)?
            .with_properties(self.metadata.metadata.clone());
        let image = image.with_valid(Mask::from_array(valid))?;
        info!(
            "Loaded {}x{} image with {} bands ({}), {} valid pixels",
            self.metadata.size_x,
            self.metadata.size_y,
            self.metadata.bands,
            self.metadata.projection,
            image.valid().count()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsg_is_taken_from_last_authority() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],AUTHORITY["EPSG","32633"]]"#;
        assert_eq!(parse_epsg(wkt).as_deref(), Some("EPSG:32633"));
        assert_eq!(normalize_crs("EPSG:4326"), "EPSG:4326");
        assert_eq!(normalize_crs("LOCAL_CS[\"x\"]"), "LOCAL_CS[\"x\"]");
    }
}
