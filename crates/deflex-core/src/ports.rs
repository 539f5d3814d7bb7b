//! Port trait definitions
//!
//! These traits define the interfaces that the external data services
//! (geometry provider, register source, weather aggregation, turbine catalog,
//! wind-zone assignment) must implement.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{FeedinCategory, FeedinTable, LineId, MastrPlant, RegionSet, TurbineDefaults};

/// Capacity weighting table: (energy source, region, weather cell) -> capacity
pub type CapacityWeights = BTreeMap<(String, String, u32), f64>;

/// Port for model-region geometries
pub trait RegionProvider {
    /// Polygon partition of the study area for a model-region identifier
    fn model_regions(&self, map: &str) -> Result<RegionSet>;

    /// Identifiers of the power lines between regions of a model-region set
    fn power_lines(&self, map: &str) -> Result<Vec<LineId>>;
}

/// Port for the national (reegis) power-plant register
pub trait RegisterSource {
    /// Create the reegis register and return the path it was written to
    fn create_reegis_register(&self) -> Result<PathBuf>;
}

/// Port for the weather-driven feed-in aggregation
pub trait WeatherAggregator {
    /// Region-by-technology wind or solar series, capacity weighted per weather cell
    fn wind_solar(
        &self,
        weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        year: i32,
        category: FeedinCategory,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable>;

    /// Region series for run-of-river hydro
    fn hydro(
        &self,
        weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        year: i32,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable>;

    /// Region series for geothermal plants
    fn geothermal(
        &self,
        regions: &BTreeSet<String>,
        year: i32,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable>;
}

/// Port for the wind-turbine power-curve catalog
pub trait TurbineLibrary {
    /// Turbine type designations that come with a power curve
    fn types_with_power_curve(&self) -> Result<BTreeSet<String>>;
}

/// Port for wind-zone based turbine defaults
pub trait WindZoneAssigner {
    /// Default turbine data for each plant, in input order
    fn assign(&self, plants: &[MastrPlant]) -> Result<Vec<Option<TurbineDefaults>>>;
}
