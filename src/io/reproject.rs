//! Coordinate transforms between CRS definitions via GDAL/OGR.
//!
//! Axis order is forced to x/y (lon/lat for geographic CRS) so geometries read from
//! GeoJSON and traced from rasters keep their easting-first layout.
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use tracing::debug;

use super::gdal::GdalError;
use crate::core::raster::same_crs;
use crate::core::vectorize::{LakeFeature, RegionOfInterest, VectorFeatureCollection};
use crate::error::Result;

/// Spatial reference from `EPSG:XXXX`, WKT or PROJ text, in traditional GIS axis order.
pub fn spatial_ref(definition: &str) -> std::result::Result<SpatialRef, GdalError> {
    let mut srs = SpatialRef::from_definition(definition)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Reusable transform from one CRS to another.
pub struct Reprojector {
    transform: CoordTransform,
}

impl Reprojector {
    pub fn new(from: &str, to: &str) -> std::result::Result<Self, GdalError> {
        let source = spatial_ref(from)?;
        let target = spatial_ref(to)?;
        Ok(Self {
            transform: CoordTransform::new(&source, &target)?,
        })
    }

    fn line_string(&self, ls: &LineString<f64>) -> std::result::Result<LineString<f64>, GdalError> {
        let mut xs: Vec<f64> = ls.coords().map(|c| c.x).collect();
        let mut ys: Vec<f64> = ls.coords().map(|c| c.y).collect();
        let mut zs = vec![0.0; xs.len()];
        self.transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
        Ok(LineString::new(
            xs.into_iter().zip(ys).map(|(x, y)| Coord { x, y }).collect(),
        ))
    }

    pub fn polygon(&self, p: &Polygon<f64>) -> std::result::Result<Polygon<f64>, GdalError> {
        let exterior = self.line_string(p.exterior())?;
        let interiors = p
            .interiors()
            .iter()
            .map(|ring| self.line_string(ring))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    pub fn multi_polygon(&self, mp: &MultiPolygon<f64>) -> std::result::Result<MultiPolygon<f64>, GdalError> {
        Ok(MultiPolygon::new(
            mp.0.iter()
                .map(|p| self.polygon(p))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ))
    }

    /// Polygonal geometries only; other kinds pass through unchanged.
    pub fn geometry(&self, g: &Geometry<f64>) -> std::result::Result<Geometry<f64>, GdalError> {
        Ok(match g {
            Geometry::Polygon(p) => Geometry::Polygon(self.polygon(p)?),
            Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(self.multi_polygon(mp)?),
            other => other.clone(),
        })
    }
}

/// Express `roi` in `crs`, transforming only when the CRS differs.
pub fn reproject_roi(roi: &RegionOfInterest, crs: &str) -> Result<RegionOfInterest> {
    if same_crs(&roi.crs, crs) {
        return Ok(roi.clone());
    }
    debug!("Reprojecting ROI from {} to {}", roi.crs, crs);
    let reprojector = Reprojector::new(&roi.crs, crs)?;
    Ok(RegionOfInterest::new(
        reprojector.multi_polygon(&roi.geometry)?,
        crs,
    ))
}

/// Express every feature in `crs`. Areas stay in the source CRS units.
pub fn reproject_features(
    collection: &VectorFeatureCollection,
    crs: &str,
) -> Result<VectorFeatureCollection> {
    if same_crs(&collection.crs, crs) {
        return Ok(collection.clone());
    }
    debug!(
        "Reprojecting {} features from {} to {}",
        collection.len(),
        collection.crs,
        crs
    );
    let reprojector = Reprojector::new(&collection.crs, crs)?;
    let features = collection
        .features
        .iter()
        .map(|f| {
            Ok(LakeFeature {
                geometry: reprojector.geometry(&f.geometry)?,
                ..f.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(VectorFeatureCollection {
        crs: crs.to_string(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn same_crs_is_identity() {
        let roi = RegionOfInterest::from_polygon(
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
            "epsg:32633",
        );
        let out = reproject_roi(&roi, "EPSG:32633").unwrap();
        assert_eq!(out, roi);
    }

    fn utm_square() -> Polygon<f64> {
        polygon![
            (x: 500_000.0, y: 4_000_000.0),
            (x: 500_100.0, y: 4_000_000.0),
            (x: 500_100.0, y: 4_000_100.0),
            (x: 500_000.0, y: 4_000_100.0),
        ]
    }

    #[test]
    fn utm_features_become_lon_lat() {
        let collection = VectorFeatureCollection {
            crs: "EPSG:32633".to_string(),
            features: vec![LakeFeature {
                id: 1,
                geometry: Geometry::Polygon(utm_square()),
                pixel_count: 100,
                area: 10_000.0,
            }],
        };
        let out = reproject_features(&collection, "EPSG:4326").unwrap();
        assert_eq!(out.crs, "EPSG:4326");
        assert_eq!(out.features[0].area, 10_000.0);
        let Geometry::Polygon(p) = &out.features[0].geometry else {
            panic!("expected a polygon");
        };
        // easting 500000 lies on the zone 33 central meridian (15E)
        let first = p.exterior().0[0];
        assert!((first.x - 15.0).abs() < 1e-9, "lon {}", first.x);
        assert!(first.y > 35.9 && first.y < 36.3, "lat {}", first.y);
        assert!(p.exterior().coords().all(|c| c.x >= 15.0 - 1e-9 && c.x < 15.01));
    }

    #[test]
    fn roi_round_trips_through_wgs84() {
        let roi = RegionOfInterest::from_polygon(utm_square(), "EPSG:32633");
        let geographic = reproject_roi(&roi, "EPSG:4326").unwrap();
        assert_eq!(geographic.crs, "EPSG:4326");
        let back = reproject_roi(&geographic, "EPSG:32633").unwrap();
        for (a, b) in roi.geometry.0[0]
            .exterior()
            .coords()
            .zip(back.geometry.0[0].exterior().coords())
        {
            assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3);
        }
    }
}
