//! Affine geotransform for north-up rasters and the small amount of grid arithmetic
//! the pipeline needs (pixel ↔ map coordinates, windows, resolution changes).

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients, GDAL order semantics:
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Usually negative
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// From GDAL's `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map coordinates of a fractional pixel position (col, row measured from the
    /// top-left corner of the grid).
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Map coordinates of the pixel center
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel coordinates of a map position; NaN for degenerate transforms.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        (col, row)
    }

    /// Ground area covered by one pixel
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation).abs()
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.row_rotation.abs() < 1e-12 && self.col_rotation.abs() < 1e-12
    }

    /// True when both pixel dimensions equal `resolution` up to a relative epsilon.
    pub fn has_resolution(&self, resolution: f64) -> bool {
        let close = |a: f64| (a.abs() - resolution).abs() <= resolution * 1e-9;
        self.is_axis_aligned() && close(self.pixel_width) && close(self.pixel_height)
    }

    /// Transform of the sub-grid whose top-left pixel is (`col`, `row`).
    pub fn window(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.apply(col as f64, row as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Same origin and axis signs, square pixels of `resolution` map units.
    pub fn with_resolution(&self, resolution: f64) -> Self {
        Self {
            pixel_width: resolution.copysign(self.pixel_width),
            pixel_height: resolution.copysign(self.pixel_height),
            ..*self
        }
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of a `width` x `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(width as f64, 0.0),
            self.apply(0.0, height as f64),
            self.apply(width as f64, height as f64),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), &(x, y)| (a.min(x), b.min(y), c.max(x), d.max(y)),
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_round_trip() {
        let gt = GeoTransform::new(500_000.0, 4_600_000.0, 10.0, -10.0);
        let (x, y) = gt.pixel_center(3, 7);
        assert_relative_eq!(x, 500_035.0);
        assert_relative_eq!(y, 4_599_925.0);
        let (col, row) = gt.invert(x, y);
        assert_relative_eq!(col, 3.5);
        assert_relative_eq!(row, 7.5);
    }

    #[test]
    fn window_shifts_origin_only() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        let w = gt.window(2, 3);
        assert_relative_eq!(w.origin_x, 120.0);
        assert_relative_eq!(w.origin_y, 170.0);
        assert_eq!(w.pixel_width, 10.0);
        assert_eq!(w.pixel_height, -10.0);
    }

    #[test]
    fn resolution_checks() {
        let gt = GeoTransform::new(0.0, 0.0, 10.0, -10.0);
        assert!(gt.has_resolution(10.0));
        assert!(!gt.has_resolution(20.0));
        let coarse = gt.with_resolution(20.0);
        assert_eq!(coarse.pixel_width, 20.0);
        assert_eq!(coarse.pixel_height, -20.0);
        assert_relative_eq!(coarse.pixel_area(), 400.0);
    }

    #[test]
    fn bounds_of_north_up_grid() {
        let gt = GeoTransform::new(0.0, 100.0, 10.0, -10.0);
        assert_eq!(gt.bounds(5, 4), (0.0, 60.0, 50.0, 100.0));
    }
}
