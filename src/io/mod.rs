//! I/O layer around the core: GDAL-backed raster reading, ROI GeoJSON reading, CRS
//! transforms, and `writers` for the GeoTIFF, GeoJSON and sidecar outputs.
pub mod gdal;
pub use gdal::{GdalError, GdalImageReader, GdalMetadata};

pub mod reproject;
pub use reproject::{Reprojector, reproject_features, reproject_roi};

pub mod roi;
pub use roi::{parse_roi, read_roi};

pub mod writers;
