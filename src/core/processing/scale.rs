use tracing::debug;

use crate::core::processing::ops::divide_array;
use crate::core::raster::RasterImage;

/// Documented Sentinel-2 L1C quantification value
pub const REFLECTANCE_SCALE: f64 = 10_000.0;

/// Convert digital numbers to reflectance by dividing every band by `scale_factor`.
/// Band names, grid, validity and acquisition properties pass through unchanged.
/// `scale_factor` is validated nonzero with the rest of the parameters.
pub fn scale_reflectance(image: &RasterImage, scale_factor: f64) -> RasterImage {
    debug!(
        "Scaling {} bands by 1/{}",
        image.band_names().count(),
        scale_factor
    );
    image.map_bands(|band| divide_array(band, scale_factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::collections::BTreeMap;

    #[test]
    fn scaling_round_trips_raw_values() {
        let raw = array![[0.0, 1.0, 1234.0], [9999.0, 10000.0, 65535.0]];
        let props = BTreeMap::from([("SPACECRAFT_NAME".to_string(), "Sentinel-2A".to_string())]);
        let img = RasterImage::new(
            GeoTransform::default(),
            "EPSG:32633",
            vec![("B2".into(), raw.clone()), ("B3".into(), raw.clone())],
        )
        .unwrap()
        .with_properties(props.clone());

        let scaled = scale_reflectance(&img, REFLECTANCE_SCALE);
        assert_eq!(scaled.band_names().collect::<Vec<_>>(), vec!["B2", "B3"]);
        assert_eq!(scaled.properties(), &props);
        assert_eq!(scaled.valid(), img.valid());
        for (s, r) in scaled.band("B3").unwrap().iter().zip(raw.iter()) {
            assert_relative_eq!(s * REFLECTANCE_SCALE, *r, max_relative = 1e-12);
        }
        assert_relative_eq!(scaled.band("B2").unwrap()[[1, 1]], 1.0);
    }
}
