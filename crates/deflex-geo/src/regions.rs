//! GeoJSON readers for region outlines and power lines

use deflex_core::error::{DeflexError, Result};
use deflex_core::models::{Geometry, LineId, ModelRegion, RegionSet};
use std::fs;
use std::path::Path;

fn read_geojson(path: &Path) -> Result<geojson::GeoJson> {
    if !path.is_file() {
        return Err(DeflexError::FileNotFound {
            path: path.to_path_buf(),
            hint: "Check the geometries directory.".to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    content.parse::<geojson::GeoJson>().map_err(|e| {
        DeflexError::Serialization(format!("Failed to parse GeoJSON {}: {}", path.display(), e))
    })
}

fn features(geojson: geojson::GeoJson) -> Vec<geojson::Feature> {
    match geojson {
        geojson::GeoJson::FeatureCollection(fc) => fc.features,
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::Geometry(_) => Vec::new(),
    }
}

/// Label of a feature: the named property, falling back to the feature id
fn feature_label(feature: &geojson::Feature, property: &str) -> Option<String> {
    let from_property = feature.property(property).and_then(|value| match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    from_property.or_else(|| {
        feature.id.as_ref().map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
    })
}

/// Read labelled polygons, e.g. model regions or wind zones
pub fn load_named_polygons(path: &Path, name_property: &str) -> Result<Vec<ModelRegion>> {
    let mut polygons = Vec::new();

    for (idx, feature) in features(read_geojson(path)?).into_iter().enumerate() {
        let name = feature_label(&feature, name_property).ok_or_else(|| {
            DeflexError::InvalidRecord {
                row: idx,
                reason: format!("feature has no '{}' property", name_property),
            }
        })?;

        let geometry = feature
            .geometry
            .as_ref()
            .and_then(|g| serde_json::to_value(g).ok())
            .and_then(|v| Geometry::from_geojson(&v))
            .filter(Geometry::is_areal)
            .ok_or_else(|| {
                DeflexError::Geometry(format!("feature {} has no polygon geometry", name))
            })?;

        polygons.push(ModelRegion::new(name, geometry));
    }

    tracing::debug!("Read {} polygons from {}", polygons.len(), path.display());
    Ok(polygons)
}

/// Read the model regions of `map` from a GeoJSON feature collection
pub fn load_regions_geojson(path: &Path, map: &str, name_property: &str) -> Result<RegionSet> {
    Ok(RegionSet::new(map, load_named_polygons(path, name_property)?))
}

/// Read power-line identifiers ("DE01-DE02") from a GeoJSON feature collection
pub fn load_power_lines_geojson(path: &Path, name_property: &str) -> Result<Vec<LineId>> {
    features(read_geojson(path)?)
        .iter()
        .enumerate()
        .map(|(idx, feature)| {
            feature_label(feature, name_property)
                .ok_or_else(|| DeflexError::InvalidRecord {
                    row: idx,
                    reason: format!("power line has no '{}' property", name_property),
                })?
                .parse::<LineId>()
        })
        .collect()
}
