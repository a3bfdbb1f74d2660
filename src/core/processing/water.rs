use ndarray::Zip;
use tracing::info;

use crate::core::params::{BandMap, WaterParams};
use crate::core::processing::ops::normalized_difference;
use crate::core::raster::{Classification, LakeMask, RasterImage};
use crate::error::{Error, Result};
use crate::types::BandRole;

/// Strict lake test on precomputed indices.
#[inline]
pub fn is_lake(ndwi: f64, green_minus_red: f64, params: &WaterParams) -> bool {
    ndwi > params.ndwi_threshold && green_minus_red > params.green_red_margin
}

/// Classify one pixel. Invalid pixels and an undefined blue/red index are not evaluated.
#[inline]
pub fn classify_pixel(
    blue: f64,
    green: f64,
    red: f64,
    valid: bool,
    params: &WaterParams,
) -> Classification {
    if !valid {
        return Classification::NotEvaluated;
    }
    let Some(ndwi) = normalized_difference(blue, red) else {
        return Classification::NotEvaluated;
    };
    let green_minus_red = green - red;
    if !green_minus_red.is_finite() {
        return Classification::NotEvaluated;
    }
    if is_lake(ndwi, green_minus_red, params) {
        Classification::Lake
    } else {
        Classification::NonLake
    }
}

/// Run the water test over the valid pixels of `image`.
pub fn detect_lakes(image: &RasterImage, bands: &BandMap, params: &WaterParams) -> Result<LakeMask> {
    let blue = image.role_band(bands, BandRole::Blue)?;
    let green = image.role_band(bands, BandRole::Green)?;
    let red = image.role_band(bands, BandRole::Red)?;
    let cells = Zip::from(blue)
        .and(green)
        .and(red)
        .and(image.valid().as_array())
        .par_map_collect(|&b, &g, &r, &v| classify_pixel(b, g, r, v, params));
    Ok(LakeMask::new(cells))
}

/// Detect lakes and merge the result into the image as band `band_name`.
/// The name is checked before any pixel is classified.
pub fn add_lake_band(
    image: &RasterImage,
    bands: &BandMap,
    params: &WaterParams,
    band_name: &str,
) -> Result<RasterImage> {
    if image.has_band(band_name) {
        return Err(Error::BandNameCollision {
            name: band_name.to_string(),
        });
    }
    let lakes = detect_lakes(image, bands, params)?;
    info!(
        "Water detection: {} lake pixels out of {} valid",
        lakes.lake_count(),
        image.valid().count()
    );
    image.with_lake_band(band_name, lakes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use ndarray::array;

    #[test]
    fn thresholds_are_strict() {
        let p = WaterParams::default();
        assert!(!is_lake(0.18, 0.5, &p));
        assert!(is_lake(0.18 + 1e-9, 0.5, &p));
        assert!(!is_lake(0.5, 0.09, &p));
        assert!(is_lake(0.5, 0.09 + 1e-9, &p));
    }

    #[test]
    fn pixel_exactly_at_threshold_is_not_lake() {
        // Dyadic values keep the arithmetic exact: nd(0.625, 0.375) == 0.25
        let p = WaterParams {
            ndwi_threshold: 0.25,
            green_red_margin: 0.125,
        };
        assert_eq!(classify_pixel(0.625, 0.75, 0.375, true, &p), Classification::NonLake);
        assert_eq!(classify_pixel(0.626, 0.75, 0.375, true, &p), Classification::Lake);
        // green - red exactly 0.125
        assert_eq!(classify_pixel(0.75, 0.5, 0.375, true, &p), Classification::NonLake);
    }

    #[test]
    fn degenerate_and_invalid_pixels_are_not_evaluated() {
        let p = WaterParams::default();
        assert_eq!(classify_pixel(0.0, 0.5, 0.0, true, &p), Classification::NotEvaluated);
        assert_eq!(classify_pixel(0.5, 0.5, 0.1, false, &p), Classification::NotEvaluated);
        assert_eq!(classify_pixel(0.5, f64::NAN, 0.1, true, &p), Classification::NotEvaluated);
    }

    #[test]
    fn lake_band_is_merged_and_binary() {
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![
                ("B2".into(), array![[0.3, 0.1], [0.0, 0.3]]),
                ("B3".into(), array![[0.3, 0.1], [0.2, 0.1]]),
                ("B4".into(), array![[0.1, 0.1], [0.0, 0.1]]),
            ],
        )
        .unwrap();
        let out = add_lake_band(&img, &BandMap::default(), &WaterParams::default(), "LakeMask").unwrap();
        let lake = out.lake_band("LakeMask").unwrap();
        assert_eq!(lake.classification(0, 0), Classification::Lake);
        assert_eq!(lake.classification(0, 1), Classification::NonLake);
        assert_eq!(lake.classification(1, 0), Classification::NotEvaluated);
        assert_eq!(lake.classification(1, 1), Classification::NonLake);
        assert!(lake.samples().flatten().all(|v| v == 0 || v == 1));

        let err = add_lake_band(&out, &BandMap::default(), &WaterParams::default(), "LakeMask")
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
