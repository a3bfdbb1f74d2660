use ndarray::{Array2, Zip};
use tracing::debug;

use super::{GeoTransform, RasterImage};
use crate::core::params::BandMap;
use crate::core::vectorize::{RegionOfInterest, ResolvedMask};
use crate::error::Result;
use crate::types::BandRole;

/// Red, green and blue reflectance on the grid of a resolved lake mask.
/// Invalid pixels and pixels outside the ROI are 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbComposite {
    pub red: Array2<f32>,
    pub green: Array2<f32>,
    pub blue: Array2<f32>,
    pub geotransform: GeoTransform,
    pub crs: String,
}

impl RgbComposite {
    pub fn shape(&self) -> (usize, usize) {
        self.red.dim()
    }

    pub fn bands(&self) -> [(&'static str, &Array2<f32>); 3] {
        [("red", &self.red), ("green", &self.green), ("blue", &self.blue)]
    }
}

/// Sample `image`'s red, green and blue bands onto `target`'s grid by nearest neighbour.
pub fn rgb_composite(
    image: &RasterImage,
    bands: &BandMap,
    roi: &RegionOfInterest,
    target: &ResolvedMask,
) -> Result<RgbComposite> {
    let sample = |role: BandRole| -> Result<Array2<f32>> {
        let band = image.role_band(bands, role)?;
        Ok(sample_onto(image, band, roi, target))
    };
    let composite = RgbComposite {
        red: sample(BandRole::Red)?,
        green: sample(BandRole::Green)?,
        blue: sample(BandRole::Blue)?,
        geotransform: target.geotransform,
        crs: target.crs.clone(),
    };
    debug!("Sampled RGB composite {:?}", composite.shape());
    Ok(composite)
}

fn sample_onto(
    image: &RasterImage,
    band: &Array2<f64>,
    roi: &RegionOfInterest,
    target: &ResolvedMask,
) -> Array2<f32> {
    let (rows, cols) = image.shape();
    let gt = image.geotransform();
    let valid = image.valid();
    let mut out = Array2::<f32>::zeros(target.shape());
    Zip::indexed(&mut out).par_for_each(|(r, c), v| {
        let (x, y) = target.geotransform.pixel_center(c, r);
        let (fc, fr) = gt.invert(x, y);
        if !(fc >= 0.0 && fr >= 0.0) {
            return;
        }
        let (sc, sr) = (fc.floor() as usize, fr.floor() as usize);
        if sr < rows && sc < cols && valid.get(sr, sc) && roi.contains(x, y) {
            *v = band[[sr, sc]] as f32;
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::Mask;
    use geo::polygon;

    fn image() -> RasterImage {
        let bands = [("B2", 0.1), ("B3", 0.2), ("B4", 0.3)]
            .iter()
            .map(|&(n, v)| (n.to_string(), Array2::from_elem((4, 4), v)))
            .collect();
        let img = RasterImage::new(GeoTransform::new(0.0, 40.0, 10.0, -10.0), "EPSG:32633", bands)
            .unwrap();
        let valid = Array2::from_shape_fn((4, 4), |(r, c)| (r, c) != (0, 0));
        img.with_valid(Mask::from_array(valid)).unwrap()
    }

    fn target(roi_max_x: f64) -> (RegionOfInterest, ResolvedMask) {
        let roi = RegionOfInterest::from_polygon(
            polygon![(x: 0.0, y: 0.0), (x: roi_max_x, y: 0.0), (x: roi_max_x, y: 40.0), (x: 0.0, y: 40.0)],
            "EPSG:32633",
        );
        let mask = ResolvedMask {
            grid: Array2::from_elem((4, 4), false),
            geotransform: GeoTransform::new(0.0, 40.0, 10.0, -10.0),
            crs: "EPSG:32633".to_string(),
            resolution: 10.0,
            coarsening: 1,
        };
        (roi, mask)
    }

    #[test]
    fn bands_follow_roles_and_invalid_pixels_are_zero() {
        let (roi, mask) = target(40.0);
        let rgb = rgb_composite(&image(), &BandMap::default(), &roi, &mask).unwrap();
        assert_eq!(rgb.shape(), (4, 4));
        assert_eq!(rgb.red[[1, 1]], 0.3);
        assert_eq!(rgb.green[[1, 1]], 0.2);
        assert_eq!(rgb.blue[[1, 1]], 0.1);
        assert_eq!(rgb.red[[0, 0]], 0.0);
    }

    #[test]
    fn pixels_outside_roi_are_zero() {
        let (roi, mask) = target(20.0);
        let rgb = rgb_composite(&image(), &BandMap::default(), &roi, &mask).unwrap();
        assert_eq!(rgb.red[[2, 1]], 0.3);
        assert!(rgb.red.column(3).iter().all(|&v| v == 0.0));
    }
}
