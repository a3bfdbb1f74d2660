use std::path::Path;

use geo::{Geometry, MultiPolygon, Polygon};
use geojson::{GeoJson, JsonObject};
use tracing::info;

use crate::core::vectorize::RegionOfInterest;
use crate::error::{Error, Result};

/// CRS assumed for GeoJSON without a legacy `crs` member.
pub const GEOJSON_DEFAULT_CRS: &str = "EPSG:4326";

/// Legacy `"crs": {"type": "name", "properties": {"name": ...}}` member, normalized to
/// `EPSG:XXXX` for the OGC URN and CRS84 spellings.
fn named_crs(members: Option<&JsonObject>) -> Option<String> {
    let name = members?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?
        .trim()
        .to_string();
    if name.ends_with("CRS84") {
        return Some(GEOJSON_DEFAULT_CRS.to_string());
    }
    if let Some(code) = name
        .strip_prefix("urn:ogc:def:crs:EPSG:")
        .map(|rest| rest.trim_start_matches(':'))
        .and_then(|rest| rest.rsplit(':').next())
    {
        return Some(format!("EPSG:{}", code));
    }
    Some(name)
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Parse a ROI from GeoJSON text: every polygonal geometry in it is part of the region.
pub fn parse_roi(text: &str) -> Result<RegionOfInterest> {
    let geojson: GeoJson = text.parse()?;
    let mut polygons = Vec::new();
    let crs = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = named_crs(fc.foreign_members.as_ref());
            for feature in fc.features {
                if let Some(g) = feature.geometry {
                    collect_polygons(Geometry::try_from(g)?, &mut polygons);
                }
            }
            crs
        }
        GeoJson::Feature(feature) => {
            let crs = named_crs(feature.foreign_members.as_ref());
            if let Some(g) = feature.geometry {
                collect_polygons(Geometry::try_from(g)?, &mut polygons);
            }
            crs
        }
        GeoJson::Geometry(g) => {
            let crs = named_crs(g.foreign_members.as_ref());
            collect_polygons(Geometry::try_from(g)?, &mut polygons);
            crs
        }
    };
    if polygons.is_empty() {
        return Err(Error::InvalidArgument {
            arg: "roi",
            value: "no polygon geometry".to_string(),
        });
    }
    Ok(RegionOfInterest::new(
        MultiPolygon::new(polygons),
        crs.unwrap_or_else(|| GEOJSON_DEFAULT_CRS.to_string()),
    ))
}

/// Read a ROI GeoJSON file.
pub fn read_roi(path: &Path) -> Result<RegionOfInterest> {
    let text = std::fs::read_to_string(path)?;
    let roi = parse_roi(&text)?;
    info!(
        "Loaded ROI {:?}: {} polygon(s) in {}",
        path,
        roi.geometry.0.len(),
        roi.crs
    );
    Ok(roi)
}
