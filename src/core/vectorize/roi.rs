use geo::{BoundingRect, Intersects, MultiPolygon, Point, Polygon};

use crate::core::raster::GeoTransform;

/// Region of interest: the only area processed and vectorized.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    pub geometry: MultiPolygon<f64>,
    pub crs: String,
}

/// Rectangular block of a grid, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl RegionOfInterest {
    pub fn new(geometry: MultiPolygon<f64>, crs: impl Into<String>) -> Self {
        Self {
            geometry,
            crs: crs.into(),
        }
    }

    pub fn from_polygon(polygon: Polygon<f64>, crs: impl Into<String>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]), crs)
    }

    /// Pixel centers on the ROI boundary count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.geometry.intersects(&Point::new(x, y))
    }

    /// Smallest window of a `rows` x `cols` grid covering the ROI's bounding box,
    /// or `None` when they do not overlap.
    pub fn pixel_window(&self, gt: &GeoTransform, rows: usize, cols: usize) -> Option<PixelWindow> {
        let rect = self.geometry.bounding_rect()?;
        let corners = [
            gt.invert(rect.min().x, rect.min().y),
            gt.invert(rect.min().x, rect.max().y),
            gt.invert(rect.max().x, rect.min().y),
            gt.invert(rect.max().x, rect.max().y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return None;
        }
        let min_c = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_c = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_r = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_r = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let col0 = min_c.floor().max(0.0) as usize;
        let row0 = min_r.floor().max(0.0) as usize;
        let col1 = (max_c.ceil().max(0.0) as usize).min(cols);
        let row1 = (max_r.ceil().max(0.0) as usize).min(rows);
        if col0 >= col1 || row0 >= row1 {
            return None;
        }
        Some(PixelWindow {
            row: row0,
            col: col0,
            rows: row1 - row0,
            cols: col1 - col0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square_roi(min: f64, max: f64) -> RegionOfInterest {
        RegionOfInterest::from_polygon(
            polygon![(x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max)],
            "EPSG:32633",
        )
    }

    #[test]
    fn window_covers_roi_bounds() {
        // 10x10 grid of 10 m pixels, origin (0, 100)
        let gt = GeoTransform::new(0.0, 100.0, 10.0, -10.0);
        let roi = square_roi(25.0, 55.0);
        let w = roi.pixel_window(&gt, 10, 10).unwrap();
        assert_eq!(w, PixelWindow { row: 4, col: 2, rows: 4, cols: 4 });
    }

    #[test]
    fn window_is_clamped_and_disjoint_roi_has_none() {
        let gt = GeoTransform::new(0.0, 100.0, 10.0, -10.0);
        let w = square_roi(-50.0, 500.0).pixel_window(&gt, 10, 10).unwrap();
        assert_eq!(w, PixelWindow { row: 0, col: 0, rows: 10, cols: 10 });
        assert!(square_roi(200.0, 300.0).pixel_window(&gt, 10, 10).is_none());
    }

    #[test]
    fn boundary_points_are_inside() {
        let roi = square_roi(0.0, 10.0);
        assert!(roi.contains(5.0, 5.0));
        assert!(roi.contains(10.0, 5.0));
        assert!(!roi.contains(10.5, 5.0));
    }
}
