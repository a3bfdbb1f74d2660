//! Raster-to-vector conversion of the lake band.
//!
//! `raster_to_vector` resolves the lake band against the ROI on the output grid, labels
//! connected lake regions, and traces one feature per region. The u8 raster and the
//! polygons are both derived from the same `ResolvedMask`, so they always agree.

pub mod label;
pub mod resolve;
pub mod roi;
pub mod trace;

use geo::{Area, Coord, Geometry, MapCoords, MultiPolygon, Polygon, Simplify};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::params::VectorizeParams;
use crate::core::raster::{GeoTransform, LakeMask};
use crate::error::Result;
use crate::types::VectorizeMode;

pub use label::{Labels, label_components};
pub use resolve::{ResolvedMask, resolve_lake_mask};
pub use roi::{PixelWindow, RegionOfInterest};
pub use trace::{TracedRegion, trace_regions};

/// One connected lake region.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeFeature {
    /// 1-based, in raster-scan order of the region's first pixel
    pub id: u32,
    pub geometry: Geometry<f64>,
    pub pixel_count: usize,
    /// Area in squared CRS units
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeatureCollection {
    pub crs: String,
    pub features: Vec<LakeFeature>,
}

impl VectorFeatureCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn total_area(&self) -> f64 {
        self.features.iter().map(|f| f.area).sum()
    }

    pub fn summary(&self) -> VectorSummary {
        VectorSummary {
            crs: self.crs.clone(),
            features: self.len(),
            lake_pixels: self.features.iter().map(|f| f.pixel_count).sum(),
            total_area: self.total_area(),
        }
    }
}

/// Counts recorded in the output sidecar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSummary {
    pub crs: String,
    pub features: usize,
    pub lake_pixels: usize,
    pub total_area: f64,
}

fn pixel_area(polygons: &[Polygon<f64>]) -> f64 {
    polygons.iter().map(|p| p.unsigned_area()).sum()
}

/// Douglas-Peucker in pixel space, or `None` when the result degenerates or drifts
/// from the exact pixel area by more than `area_tolerance`.
fn simplified(region: &TracedRegion, params: &VectorizeParams) -> Option<Vec<Polygon<f64>>> {
    let polygons: Vec<Polygon<f64>> = region
        .polygons
        .iter()
        .map(|p| p.simplify(&params.simplify_tolerance))
        .collect();
    let degenerate = polygons.iter().any(|p| {
        p.exterior().0.len() < 4 || p.interiors().iter().any(|ring| ring.0.len() < 4)
    });
    if degenerate {
        return None;
    }
    let exact = region.pixel_count as f64;
    let drift = (pixel_area(&polygons) - exact).abs() / exact;
    (drift <= params.area_tolerance).then_some(polygons)
}

fn to_world(polygons: Vec<Polygon<f64>>, gt: &GeoTransform) -> Geometry<f64> {
    let mut world: Vec<Polygon<f64>> = polygons
        .iter()
        .map(|p| {
            p.map_coords(|c| {
                let (x, y) = gt.apply(c.x, c.y);
                Coord { x, y }
            })
        })
        .collect();
    if world.len() == 1 {
        Geometry::Polygon(world.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(world))
    }
}

/// Trace the lake regions of `mask` into features in the mask's CRS.
pub fn polygonize(mask: &ResolvedMask, params: &VectorizeParams) -> Result<VectorFeatureCollection> {
    let labels = label_components(&mask.grid, params.connectivity, params.tile_size);
    let regions = trace_regions(&labels);
    let cell_area = mask.geotransform.pixel_area();

    let features: Vec<(LakeFeature, bool)> = regions
        .into_par_iter()
        .map(|region| {
            let approximate = match params.mode {
                VectorizeMode::Exact => None,
                VectorizeMode::Approximate => simplified(&region, params),
            };
            let fell_back = params.mode == VectorizeMode::Approximate && approximate.is_none();
            let polygons = approximate.unwrap_or_else(|| region.polygons.clone());
            let area = pixel_area(&polygons) * cell_area;
            let feature = LakeFeature {
                id: region.id,
                geometry: to_world(polygons, &mask.geotransform),
                pixel_count: region.pixel_count,
                area,
            };
            (feature, fell_back)
        })
        .collect();

    let fallbacks = features.iter().filter(|(_, f)| *f).count();
    if fallbacks > 0 {
        debug!("{} regions kept exact rings after simplification drift", fallbacks);
    }
    let features: Vec<LakeFeature> = features.into_iter().map(|(f, _)| f).collect();
    info!(
        "Vectorized {} lake regions ({} connectivity, {} mode)",
        features.len(),
        params.connectivity,
        params.mode
    );
    Ok(VectorFeatureCollection {
        crs: mask.crs.clone(),
        features,
    })
}

/// Resolve the lake band against `roi` and vectorize it.
pub fn raster_to_vector(
    lake: &LakeMask,
    gt: &GeoTransform,
    crs: &str,
    roi: &RegionOfInterest,
    params: &VectorizeParams,
) -> Result<(ResolvedMask, VectorFeatureCollection)> {
    let resolved = resolve_lake_mask(lake, gt, crs, roi, params)?;
    let vectors = polygonize(&resolved, params)?;
    Ok((resolved, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::Classification;
    use crate::types::Connectivity;
    use approx::assert_relative_eq;
    use geo::polygon;
    use ndarray::Array2;

    const CRS: &str = "EPSG:32633";

    fn lake_from(rows: &[&str]) -> LakeMask {
        let cols = rows[0].len();
        LakeMask::new(Array2::from_shape_fn((rows.len(), cols), |(r, c)| {
            if rows[r].as_bytes()[c] == b'#' {
                Classification::Lake
            } else {
                Classification::NonLake
            }
        }))
    }

    fn full_roi(size: f64) -> RegionOfInterest {
        RegionOfInterest::from_polygon(
            polygon![(x: 0.0, y: 0.0), (x: size, y: 0.0), (x: size, y: size), (x: 0.0, y: size)],
            CRS,
        )
    }

    fn run(rows: &[&str], params: &VectorizeParams) -> (ResolvedMask, VectorFeatureCollection) {
        let gt = GeoTransform::new(0.0, rows.len() as f64 * 10.0, 10.0, -10.0);
        raster_to_vector(&lake_from(rows), &gt, CRS, &full_roi(rows.len() as f64 * 10.0), params).unwrap()
    }

    const BLOCK: [&str; 6] = ["......", ".###..", ".###..", ".###..", "......", "......"];

    #[test]
    fn no_lakes_gives_empty_collection() {
        let (mask, vectors) = run(&["....", "....", "....", "...."], &VectorizeParams::default());
        assert_eq!(mask.lake_count(), 0);
        assert!(vectors.is_empty());
        assert_eq!(vectors.crs, CRS);
    }

    #[test]
    fn block_area_matches_in_both_modes() {
        for mode in [VectorizeMode::Exact, VectorizeMode::Approximate] {
            let params = VectorizeParams {
                mode,
                ..Default::default()
            };
            let (mask, vectors) = run(&BLOCK, &params);
            assert_eq!(mask.lake_count(), 9);
            assert_eq!(vectors.len(), 1);
            let f = &vectors.features[0];
            assert_eq!(f.id, 1);
            assert_eq!(f.pixel_count, 9);
            assert!(matches!(f.geometry, Geometry::Polygon(_)));
            assert_relative_eq!(f.geometry.unsigned_area(), 900.0, epsilon = 1e-9);
            assert_relative_eq!(f.area, 900.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn polygon_lies_on_pixel_edges_in_world_coordinates() {
        let (_, vectors) = run(&BLOCK, &VectorizeParams { mode: VectorizeMode::Exact, ..Default::default() });
        let Geometry::Polygon(p) = &vectors.features[0].geometry else {
            panic!("expected polygon");
        };
        let xs: Vec<f64> = p.exterior().coords().map(|c| c.x).collect();
        let ys: Vec<f64> = p.exterior().coords().map(|c| c.y).collect();
        assert_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f64::INFINITY, f64::min), 20.0);
        assert_eq!(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 50.0);
    }

    #[test]
    fn connectivity_controls_diagonal_merging() {
        let rows = ["##..", "##..", "..##", "..##"];
        let eight = VectorizeParams {
            connectivity: Connectivity::Eight,
            ..Default::default()
        };
        let (_, merged) = run(&rows, &eight);
        assert_eq!(merged.len(), 1);
        assert!(matches!(merged.features[0].geometry, Geometry::MultiPolygon(ref mp) if mp.0.len() == 2));

        let four = VectorizeParams {
            connectivity: Connectivity::Four,
            ..Default::default()
        };
        let (_, split) = run(&rows, &four);
        assert_eq!(split.len(), 2);
        assert_relative_eq!(split.total_area(), 800.0, epsilon = 1e-9);
    }

    #[test]
    fn island_hole_is_preserved() {
        let rows = ["#####", "#...#", "#...#", "#...#", "#####"];
        let (_, vectors) = run(&rows, &VectorizeParams::default());
        let Geometry::Polygon(p) = &vectors.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(p.interiors().len(), 1);
        assert_relative_eq!(vectors.features[0].area, 1600.0, epsilon = 1e-9);
    }

    #[test]
    fn approximate_disk_stays_close_to_pixel_area() {
        let n = 41;
        let grid: Vec<String> = (0..n)
            .map(|r| {
                (0..n)
                    .map(|c| {
                        let (dr, dc) = (r as f64 - 20.0, c as f64 - 20.0);
                        if dr * dr + dc * dc <= 18.0 * 18.0 { '#' } else { '.' }
                    })
                    .collect()
            })
            .collect();
        let rows: Vec<&str> = grid.iter().map(String::as_str).collect();
        let (mask, exact) = run(&rows, &VectorizeParams { mode: VectorizeMode::Exact, ..Default::default() });
        let (_, approx) = run(&rows, &VectorizeParams::default());
        let pixel_area = mask.lake_count() as f64 * 100.0;
        assert_relative_eq!(exact.total_area(), pixel_area, epsilon = 1e-6);
        assert!((approx.total_area() - pixel_area).abs() / pixel_area <= 0.02);
        assert_eq!(approx.summary().lake_pixels, mask.lake_count());
    }
}
