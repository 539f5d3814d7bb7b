use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Names of the tracked capacity columns, base name first
pub const CAPACITY_COLUMNS: [&str; 2] = ["capacity", "capacity_in"];

/// Well-known values of the classification columns
pub mod technology {
    pub const WIND: &str = "Wind";
    pub const SOLAR: &str = "Solar";
    pub const BIOENERGY: &str = "Bioenergy";
    pub const HYDRO: &str = "Hydro";
    pub const GEOTHERMAL: &str = "Geothermal";

    pub const ONSHORE: &str = "Onshore";
    pub const OFFSHORE: &str = "Offshore";
    pub const PUMPED_STORAGE: &str = "Pumped storage";
}

/// Effective capacities of a plant for one year
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearCapacity {
    /// Effective electrical capacity (`capacity_<year>`)
    pub capacity: f64,

    /// Effective fuel input capacity (`capacity_in_<year>`)
    pub capacity_in: f64,
}

/// One row of a power-plant register
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerPlant {
    /// Register identifier
    pub id: String,

    /// Latitude in WGS 84
    pub lat: Option<f64>,

    /// Longitude in WGS 84
    pub lon: Option<f64>,

    /// Energy source classification (e.g. "Wind", "Solar")
    pub energy_source_level_2: String,

    /// Sub-technology (e.g. "Onshore", "Offshore", "Pumped storage")
    pub technology: String,

    /// Administrative state code (e.g. "MV", "SH")
    pub federal_states: String,

    /// Nameplate capacity
    pub capacity: f64,

    /// Fuel input capacity, derived from capacity and efficiency
    pub capacity_in: Option<f64>,

    /// Electrical efficiency
    pub efficiency: Option<f64>,

    /// Commissioning year, `None` if unknown (never counted as in service)
    pub com_year: Option<i32>,

    /// Commissioning month (1-12)
    pub com_month: Option<u32>,

    /// Decommissioning year, `None` while in service
    pub decom_year: Option<i32>,

    /// Decommissioning month (1-12)
    pub decom_month: Option<u32>,

    /// Weather cell identifier
    pub coastdat2: Option<u32>,

    /// Assigned model region
    pub region: Option<String>,

    /// Derived per-year capacities, keyed by year
    pub yearly: BTreeMap<i32, YearCapacity>,

    /// Columns without a typed field, kept verbatim
    pub attributes: BTreeMap<String, String>,
}

impl PowerPlant {
    /// Point coordinates as `[lon, lat]` if both are known and finite
    pub fn coordinates(&self) -> Option<[f64; 2]> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Some([lon, lat]),
            _ => None,
        }
    }

    /// Fuel input capacity, falling back to the electrical capacity
    pub fn capacity_in_or_capacity(&self) -> f64 {
        self.capacity_in.unwrap_or(self.capacity)
    }

    /// Effective capacities for a year, zero if the year was not derived
    pub fn capacity_for(&self, year: i32) -> YearCapacity {
        self.yearly.get(&year).copied().unwrap_or_default()
    }

    pub fn is_source(&self, energy_source: &str) -> bool {
        self.energy_source_level_2 == energy_source
    }
}

/// An ordered collection of power plants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerPlantTable {
    plants: Vec<PowerPlant>,
}

impl PowerPlantTable {
    pub fn new(plants: Vec<PowerPlant>) -> Self {
        Self { plants }
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerPlant> {
        self.plants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PowerPlant> {
        self.plants.iter_mut()
    }

    pub fn plants(&self) -> &[PowerPlant] {
        &self.plants
    }

    pub fn into_plants(self) -> Vec<PowerPlant> {
        self.plants
    }

    /// Keep only plants matching the predicate, returning how many were removed
    pub fn retain<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&PowerPlant) -> bool,
    {
        let before = self.plants.len();
        self.plants.retain(predicate);
        before - self.plants.len()
    }

    /// Years for which derived capacity columns exist
    pub fn year_columns(&self) -> BTreeSet<i32> {
        self.plants.iter().flat_map(|p| p.yearly.keys().copied()).collect()
    }

    /// Names of all untyped attribute columns, in sorted order
    pub fn attribute_columns(&self) -> BTreeSet<String> {
        self.plants.iter().flat_map(|p| p.attributes.keys().cloned()).collect()
    }

    /// Sum a value over groups of plants
    pub fn sum_by<K, FK, FV>(&self, mut key: FK, mut value: FV) -> BTreeMap<K, f64>
    where
        K: Ord,
        FK: FnMut(&PowerPlant) -> K,
        FV: FnMut(&PowerPlant) -> f64,
    {
        let mut groups = BTreeMap::new();
        for plant in &self.plants {
            *groups.entry(key(plant)).or_insert(0.0) += value(plant);
        }
        groups
    }

    /// Total nameplate capacity per (region, energy source)
    pub fn capacity_by_region_and_source(&self) -> BTreeMap<(String, String), f64> {
        self.sum_by(
            |p| {
                (
                    p.region.clone().unwrap_or_default(),
                    p.energy_source_level_2.clone(),
                )
            },
            |p| p.capacity,
        )
    }
}

impl FromIterator<PowerPlant> for PowerPlantTable {
    fn from_iter<T: IntoIterator<Item = PowerPlant>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for PowerPlantTable {
    type Item = PowerPlant;
    type IntoIter = std::vec::IntoIter<PowerPlant>;

    fn into_iter(self) -> Self::IntoIter {
        self.plants.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(id: &str, region: &str, source: &str, capacity: f64) -> PowerPlant {
        PowerPlant {
            id: id.to_string(),
            energy_source_level_2: source.to_string(),
            region: Some(region.to_string()),
            capacity,
            ..Default::default()
        }
    }

    #[test]
    fn test_capacity_by_region_and_source() {
        let table: PowerPlantTable = vec![
            plant("1", "DE01", "Wind", 2.0),
            plant("2", "DE01", "Wind", 3.0),
            plant("3", "DE01", "Solar", 1.5),
            plant("4", "DE02", "Wind", 4.0),
        ]
        .into_iter()
        .collect();

        let groups = table.capacity_by_region_and_source();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&("DE01".to_string(), "Wind".to_string())], 5.0);
        assert_eq!(groups[&("DE02".to_string(), "Wind".to_string())], 4.0);
    }

    #[test]
    fn test_retain_reports_removed() {
        let mut table = PowerPlantTable::new(vec![
            plant("1", "DE01", "Wind", 2.0),
            plant("2", "DE01", "Solar", 3.0),
        ]);
        let removed = table.retain(|p| !p.is_source("Solar"));
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let mut p = plant("1", "DE01", "Wind", 1.0);
        assert_eq!(p.coordinates(), None);
        p.lat = Some(54.0);
        p.lon = Some(f64::NAN);
        assert_eq!(p.coordinates(), None);
        p.lon = Some(12.0);
        assert_eq!(p.coordinates(), Some([12.0, 54.0]));
    }
}
