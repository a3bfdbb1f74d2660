//! In-memory raster model: multiband images, validity masks, the sparse lake band and
//! the geotransform tying grids to map coordinates, and the RGB composite sampled onto
//! the output grid.
pub mod composite;
pub mod geotransform;
pub mod image;
pub mod lake;
pub mod mask;

pub use composite::{RgbComposite, rgb_composite};
pub use geotransform::GeoTransform;
pub use image::{RasterImage, same_crs};
pub use lake::{Classification, LakeMask};
pub use mask::Mask;
