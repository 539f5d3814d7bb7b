//! Conversion of region outlines into `geo` types

use deflex_core::models::Geometry;

fn ring(coords: &[[f64; 2]]) -> geo::LineString {
    coords.iter().map(|&[x, y]| geo::Coord { x, y }).collect()
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, holes)) => {
            geo::Polygon::new(ring(exterior), holes.iter().map(|r| ring(r)).collect())
        }
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Area of a region as a multipolygon; `None` for points
pub fn to_multi_polygon(geom: &Geometry) -> Option<geo::MultiPolygon> {
    match geom {
        Geometry::Polygon { coordinates } => {
            Some(geo::MultiPolygon::new(vec![polygon(coordinates)]))
        }
        Geometry::MultiPolygon { coordinates } => {
            Some(coordinates.iter().map(|p| polygon(p)).collect())
        }
        Geometry::Point { .. } => None,
    }
}
