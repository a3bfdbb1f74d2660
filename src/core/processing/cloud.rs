use ndarray::Zip;
use tracing::info;

use crate::core::params::{BandMap, CloudParams};
use crate::core::raster::{Mask, RasterImage};
use crate::error::Result;
use crate::types::BandRole;

/// Strict two-band cloud signature; a value exactly at a threshold is not cloud.
#[inline]
pub fn is_cloud(swir: f64, cirrus: f64, params: &CloudParams) -> bool {
    swir > params.swir_threshold && cirrus > params.cirrus_threshold
}

/// Pixels matching the cloud signature, regardless of current validity.
pub fn cloud_mask(image: &RasterImage, bands: &BandMap, params: &CloudParams) -> Result<Mask> {
    let swir = image.role_band(bands, BandRole::Swir)?;
    let cirrus = image.role_band(bands, BandRole::Cirrus)?;
    Ok(Mask::from_array(
        Zip::from(swir)
            .and(cirrus)
            .par_map_collect(|&s, &c| is_cloud(s, c, params)),
    ))
}

/// Invalidate cloudy pixels. Validity only ever shrinks.
pub fn mask_clouds(
    image: &RasterImage,
    bands: &BandMap,
    params: &CloudParams,
) -> Result<RasterImage> {
    let clouds = cloud_mask(image, bands, params)?;
    let valid = image.valid().and_not(&clouds)?;
    info!(
        "Cloud mask: {} cloudy pixels, {} -> {} valid",
        clouds.count(),
        image.valid().count(),
        valid.count()
    );
    image.with_valid(valid)
}
