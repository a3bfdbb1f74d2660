//! Bring the lake band onto the output grid: crop to the ROI window, resample to the
//! target resolution, apply the pixel budget, and drop pixels outside the ROI.
//!
//! The resulting `ResolvedMask` is the single artifact both the u8 raster and the
//! polygons are derived from.

use geo::BoundingRect;
use ndarray::{Array2, Zip};
use tracing::{info, warn};

use super::roi::RegionOfInterest;
use crate::core::params::VectorizeParams;
use crate::core::raster::{Classification, GeoTransform, LakeMask, same_crs};
use crate::error::{Error, Result};
use crate::types::VectorizeMode;

/// Lake pixels inside the ROI on the output grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMask {
    pub grid: Array2<bool>,
    pub geotransform: GeoTransform,
    pub crs: String,
    /// Pixel size actually used (target resolution times `coarsening`)
    pub resolution: f64,
    pub coarsening: usize,
}

impl ResolvedMask {
    pub fn shape(&self) -> (usize, usize) {
        self.grid.dim()
    }

    pub fn lake_count(&self) -> usize {
        self.grid.iter().filter(|&&v| v).count()
    }

    /// 1 for lake, 0 for everything else
    pub fn to_u8(&self) -> Array2<u8> {
        self.grid.mapv(u8::from)
    }
}

fn grid_dims(window_len: usize, source_pixel: f64, resolution: f64) -> usize {
    let extent = window_len as f64 * source_pixel.abs();
    // tolerate float noise so an exact multiple does not gain a column
    ((extent / resolution) - 1e-9).ceil().max(1.0) as usize
}

/// Single empty cell at the ROI's upper-left corner, for a ROI outside the image.
fn empty_mask(gt: &GeoTransform, crs: &str, roi: &RegionOfInterest, resolution: f64) -> ResolvedMask {
    let (x, y) = roi
        .geometry
        .bounding_rect()
        .map(|rect| (rect.min().x, rect.max().y))
        .unwrap_or((gt.origin_x, gt.origin_y));
    ResolvedMask {
        grid: Array2::from_elem((1, 1), false),
        geotransform: GeoTransform::new(x, y, resolution, -resolution),
        crs: crs.to_string(),
        resolution,
        coarsening: 1,
    }
}

/// Resolve `lake` (on grid `gt`, CRS `crs`) against `roi` at `params.resolution`.
pub fn resolve_lake_mask(
    lake: &LakeMask,
    gt: &GeoTransform,
    crs: &str,
    roi: &RegionOfInterest,
    params: &VectorizeParams,
) -> Result<ResolvedMask> {
    if !same_crs(crs, &roi.crs) {
        return Err(Error::CrsMismatch {
            left: crs.to_string(),
            right: roi.crs.clone(),
        });
    }
    if !gt.is_axis_aligned() {
        return Err(Error::Processing(
            "rotated geotransforms are not supported".to_string(),
        ));
    }
    let (rows, cols) = lake.shape();
    let Some(window) = roi.pixel_window(gt, rows, cols) else {
        warn!("Region of interest does not overlap the image; no lakes to resolve");
        return Ok(empty_mask(gt, crs, roi, params.resolution));
    };
    let origin = gt.window(window.col, window.row);

    let mut coarsening = 1usize;
    let (out_rows, out_cols, resolution) = loop {
        let resolution = params.resolution * coarsening as f64;
        let out_rows = grid_dims(window.rows, gt.pixel_height, resolution);
        let out_cols = grid_dims(window.cols, gt.pixel_width, resolution);
        let pixels = out_rows as u64 * out_cols as u64;
        if pixels <= params.max_pixels {
            break (out_rows, out_cols, resolution);
        }
        match params.mode {
            VectorizeMode::Exact => {
                return Err(Error::ResourceExhausted {
                    pixels,
                    max_pixels: params.max_pixels,
                });
            }
            VectorizeMode::Approximate => {
                let ratio = pixels as f64 / params.max_pixels as f64;
                let next = (coarsening as f64 * ratio.sqrt()).ceil() as usize;
                coarsening = next.max(coarsening + 1);
                if coarsening > params.max_coarsening {
                    return Err(Error::ResourceExhausted {
                        pixels,
                        max_pixels: params.max_pixels,
                    });
                }
                warn!(
                    "{} pixels exceed budget of {}; coarsening resolution x{}",
                    pixels, params.max_pixels, coarsening
                );
            }
        }
    };

    let out_gt = origin.with_resolution(resolution);
    let cells = lake.cells();
    let mut grid = Array2::from_elem((out_rows, out_cols), false);
    if coarsening == 1 && gt.has_resolution(params.resolution) {
        Zip::indexed(&mut grid).par_for_each(|(r, c), v| {
            let (sr, sc) = (window.row + r, window.col + c);
            if cells[[sr, sc]] == Classification::Lake {
                let (x, y) = gt.pixel_center(sc, sr);
                *v = roi.contains(x, y);
            }
        });
    } else {
        Zip::indexed(&mut grid).par_for_each(|(r, c), v| {
            let (x, y) = out_gt.pixel_center(c, r);
            let (fc, fr) = gt.invert(x, y);
            if fc < 0.0 || fr < 0.0 {
                return;
            }
            let (sc, sr) = (fc.floor() as usize, fr.floor() as usize);
            if sr < rows && sc < cols && cells[[sr, sc]] == Classification::Lake {
                *v = roi.contains(x, y);
            }
        });
    }

    info!(
        "Resolved lake mask: {}x{} at resolution {} ({} lake pixels in ROI)",
        out_cols,
        out_rows,
        resolution,
        grid.iter().filter(|&&v| v).count()
    );
    Ok(ResolvedMask {
        grid,
        geotransform: out_gt,
        crs: crs.to_string(),
        resolution,
        coarsening,
    })
}
