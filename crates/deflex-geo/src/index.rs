use crate::models::to_multi_polygon;
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::RegionSet;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{Distance, Euclidean, MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};

/// Region outline with its position in the region set
#[derive(Debug, Clone)]
struct IndexedRegion {
    id: usize,
    shape: MultiPolygon,
    envelope: AABB<[f64; 2]>,
}

impl IndexedRegion {
    fn new(id: usize, shape: MultiPolygon) -> Self {
        let envelope = match shape.bounding_rect() {
            Some(rect) => {
                let min = rect.min();
                let max = rect.max();
                AABB::from_corners([min.x, min.y], [max.x, max.y])
            }
            // Empty outlines never match; park them far outside any study area
            None => AABB::from_point([f64::MAX, f64::MAX]),
        };
        Self { id, shape, envelope }
    }
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the polygons of a model-region set
pub struct RegionIndex {
    tree: RTree<IndexedRegion>,
    names: Vec<String>,
}

impl RegionIndex {
    /// Build the index; every region must have an areal geometry
    pub fn from_regions(regions: &RegionSet) -> Result<Self> {
        let mut indexed = Vec::with_capacity(regions.len());
        let mut names = Vec::with_capacity(regions.len());

        for (id, region) in regions.regions.iter().enumerate() {
            let shape = to_multi_polygon(&region.geometry).ok_or_else(|| {
                DeflexError::Geometry(format!(
                    "region {} of {} is not a polygon",
                    region.name, regions.map
                ))
            })?;
            indexed.push(IndexedRegion::new(id, shape));
            names.push(region.name.clone());
        }

        Ok(Self { tree: RTree::bulk_load(indexed), names })
    }

    /// Name of the region containing the point (`[lon, lat]`)
    ///
    /// Overlapping regions resolve to the one listed first.
    pub fn locate(&self, point: [f64; 2]) -> Option<&str> {
        let p = Point::new(point[0], point[1]);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point(point))
            .filter(|r| r.shape.contains(&p))
            .map(|r| r.id)
            .min()
            .map(|id| self.names[id].as_str())
    }

    /// Name of the nearest region whose outline lies within `radius` of the point
    pub fn nearest_within(&self, point: [f64; 2], radius: f64) -> Option<&str> {
        let p = Point::new(point[0], point[1]);
        let search = AABB::from_corners(
            [point[0] - radius, point[1] - radius],
            [point[0] + radius, point[1] + radius],
        );

        self.tree
            .locate_in_envelope_intersecting(&search)
            .map(|r| (Euclidean.distance(&p, &r.shape), r.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| self.names[id].as_str())
    }

    /// Get the total number of regions in the index
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflex_core::models::{Geometry, ModelRegion};

    fn two_regions() -> RegionSet {
        RegionSet::new(
            "test",
            vec![
                ModelRegion::new("DE01", Geometry::rectangle([0.0, 0.0], [1.0, 1.0])),
                ModelRegion::new("DE02", Geometry::rectangle([1.0, 0.0], [2.0, 1.0])),
            ],
        )
    }

    #[test]
    fn test_locate_inside() {
        let index = RegionIndex::from_regions(&two_regions()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.locate([0.5, 0.5]), Some("DE01"));
        assert_eq!(index.locate([1.5, 0.5]), Some("DE02"));
        assert_eq!(index.locate([3.0, 0.5]), None);
    }

    #[test]
    fn test_nearest_within_radius() {
        let index = RegionIndex::from_regions(&two_regions()).unwrap();
        // 0.1 east of DE02
        assert_eq!(index.nearest_within([2.1, 0.5], 0.05), None);
        assert_eq!(index.nearest_within([2.1, 0.5], 0.15), Some("DE02"));
        // Closer to DE01 than DE02
        assert_eq!(index.nearest_within([0.2, 1.1], 2.0), Some("DE01"));
    }

    #[test]
    fn test_rejects_point_regions() {
        let regions = RegionSet::new("test", vec![ModelRegion::new("X", Geometry::point(0.0, 0.0))]);
        assert!(RegionIndex::from_regions(&regions).is_err());
    }
}
