//! Output writers: the lake mask and RGB composite GeoTIFFs, the GeoJSON feature collection and the JSON
//! run sidecar.
pub mod geojson;
pub mod metadata;
pub mod tiff;

pub use geojson::{to_feature_collection, write_geojson, write_prj_file};
pub use metadata::{METADATA_PREFIX, RunSidecar, lake_metadata_items};
pub use tiff::{write_lake_raster, write_mask_geotiff, write_rgb_geotiff, write_rgb_raster};
