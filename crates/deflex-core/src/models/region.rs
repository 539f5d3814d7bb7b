use serde::{Deserialize, Serialize};

use super::geometry::Geometry;

/// A named polygon of the model region partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRegion {
    /// Region label (e.g. "DE01")
    pub name: String,

    /// Polygon or multipolygon outline
    pub geometry: Geometry,
}

impl ModelRegion {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self { name: name.into(), geometry }
    }
}

/// All regions of one model-region configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionSet {
    /// Model-region identifier (e.g. "de21")
    pub map: String,

    pub regions: Vec<ModelRegion>,
}

impl RegionSet {
    pub fn new(map: impl Into<String>, regions: Vec<ModelRegion>) -> Self {
        Self { map: map.into(), regions }
    }

    /// Name of the register column holding the region label (e.g. "de21_region")
    pub fn region_column(&self) -> String {
        format!("{}_region", self.map)
    }

    pub fn names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
