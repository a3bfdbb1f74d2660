use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, feature::Id};
use serde_json::{Value, json};
use std::path::Path;
use tracing::info;

use crate::core::raster::same_crs;
use crate::core::vectorize::VectorFeatureCollection;
use crate::io::roi::GEOJSON_DEFAULT_CRS;

/// Convert lake features into a GeoJSON `FeatureCollection` with numeric ids. Collections
/// not in EPSG:4326 carry a legacy named `crs` member.
pub fn to_feature_collection(collection: &VectorFeatureCollection) -> FeatureCollection {
    let features = collection
        .features
        .iter()
        .map(|f| {
            let mut properties = JsonObject::new();
            properties.insert("lake_id".to_string(), json!(f.id));
            properties.insert("pixel_count".to_string(), json!(f.pixel_count));
            properties.insert("area".to_string(), json!(f.area));
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
                id: Some(Id::Number(f.id.into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let foreign_members = if same_crs(&collection.crs, GEOJSON_DEFAULT_CRS) {
        None
    } else {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({"type": "name", "properties": {"name": collection.crs}}),
        );
        Some(members)
    };

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

/// Write a .prj file with the provided projection (WKT or EPSG:XXXX)
pub fn write_prj_file(output: &Path, projection: &str) -> std::io::Result<()> {
    let prj_path = output.with_extension("prj");
    std::fs::write(prj_path, projection.as_bytes())
}

/// Write `collection` as pretty GeoJSON, plus a `.prj` sidecar when not in EPSG:4326.
pub fn write_geojson(output: &Path, collection: &VectorFeatureCollection) -> crate::Result<()> {
    let geojson = GeoJson::FeatureCollection(to_feature_collection(collection));
    let value: Value = serde_json::to_value(&geojson)?;
    std::fs::write(output, serde_json::to_string_pretty(&value)?)?;
    if !same_crs(&collection.crs, GEOJSON_DEFAULT_CRS) {
        write_prj_file(output, &collection.crs)?;
    }
    info!(
        "Wrote {} lake features to {:?} ({})",
        collection.len(),
        output,
        collection.crs
    );
    Ok(())
}
