use ndarray::Zip;
use tracing::info;

use crate::core::params::{BandMap, SurfaceParams};
use crate::core::processing::ops::normalized_difference;
use crate::core::raster::{Mask, RasterImage};
use crate::error::Result;
use crate::types::BandRole;

/// True when the pixel must be excluded as rock, ice or open sea.
/// An undefined green/SWIR index excludes the pixel as well.
#[inline]
pub fn is_non_target(green: f64, swir: f64, blue: f64, params: &SurfaceParams) -> bool {
    match normalized_difference(green, swir) {
        Some(index) => index < params.index_threshold && blue < params.blue_ceiling,
        None => true,
    }
}

/// Pixels to exclude, regardless of current validity.
pub fn surface_mask(
    image: &RasterImage,
    bands: &BandMap,
    params: &SurfaceParams,
) -> Result<Mask> {
    let green = image.role_band(bands, BandRole::Green)?;
    let swir = image.role_band(bands, BandRole::Swir)?;
    let blue = image.role_band(bands, BandRole::Blue)?;
    Ok(Mask::from_array(
        Zip::from(green)
            .and(swir)
            .and(blue)
            .par_map_collect(|&g, &s, &b| is_non_target(g, s, b, params)),
    ))
}

/// Invalidate rock/ice/sea pixels, composing with earlier exclusions.
pub fn mask_surfaces(
    image: &RasterImage,
    bands: &BandMap,
    params: &SurfaceParams,
) -> Result<RasterImage> {
    let excluded = surface_mask(image, bands, params)?;
    let valid = image.valid().and_not(&excluded)?;
    info!(
        "Surface mask: {} excluded pixels, {} -> {} valid",
        excluded.count(),
        image.valid().count(),
        valid.count()
    );
    image.with_valid(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use ndarray::array;

    #[test]
    fn rock_and_sea_are_excluded() {
        let p = SurfaceParams::default();
        // index 0.6, dark blue: excluded
        assert!(is_non_target(0.4, 0.1, 0.1, &p));
        // index 0.6, bright blue: kept
        assert!(!is_non_target(0.4, 0.1, 0.5, &p));
        // index ~0.9: kept
        assert!(!is_non_target(0.19, 0.01, 0.1, &p));
        // blue exactly at the ceiling: kept
        assert!(!is_non_target(0.4, 0.1, 0.4, &p));
    }

    #[test]
    fn degenerate_denominator_is_excluded() {
        let p = SurfaceParams::default();
        assert!(is_non_target(0.0, 0.0, 0.9, &p));
        assert!(is_non_target(0.2, -0.2, 0.9, &p));
    }

    #[test]
    fn mask_composes_with_validity() {
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![
                ("B3".into(), array![[0.4, 0.4, 0.0]]),
                ("B11".into(), array![[0.1, 0.1, 0.0]]),
                ("B2".into(), array![[0.1, 0.5, 0.5]]),
            ],
        )
        .unwrap();
        let out = mask_surfaces(&img, &BandMap::default(), &SurfaceParams::default()).unwrap();
        assert_eq!(out.valid(), &Mask::from_array(array![[false, true, false]]));
        assert!(out.valid().is_subset_of(img.valid()));
    }
}
