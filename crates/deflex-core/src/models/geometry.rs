//! Region outlines as they appear in GeoJSON files

use serde::{Deserialize, Serialize};

/// Geometry of a region or location, `[lon, lat]` in WGS 84
///
/// Serialises to the GeoJSON geometry object of the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point { coordinates: [lon, lat] }
    }

    /// Polygon from an exterior ring followed by holes
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Axis-aligned box between two corners
    pub fn rectangle(min: [f64; 2], max: [f64; 2]) -> Self {
        Geometry::polygon(vec![vec![
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
            [min[0], min[1]],
        ]])
    }

    /// Regions must be polygons or multipolygons
    pub fn is_areal(&self) -> bool {
        !matches!(self, Geometry::Point { .. })
    }

    /// Parse a GeoJSON geometry object; other geometry types give `None`
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
