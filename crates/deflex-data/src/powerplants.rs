//! Adapting the national power-plant register to the deflex model regions

use crate::apportion::get_pp_by_year;
use crate::cache::{CacheKey, FileCache};
use crate::offshore::remove_onshore_technology_from_offshore_regions;
use crate::register::{read_register, write_register};
use deflex_core::config::DeflexConfig;
use deflex_core::error::Result;
use deflex_core::models::{technology, PowerPlantTable};
use deflex_core::ports::{RegionProvider, RegisterSource};
use deflex_geo::spatial::{spatial_join_with_buffer, JoinOptions};
use std::path::PathBuf;

/// Register attribute dropped after the region join
const GEOMETRY_COLUMN: &str = "geometry";

/// Derive the fuel input capacity where it is missing
///
/// `capacity / efficiency` for plants with a positive efficiency, the
/// electrical capacity otherwise. Existing values are kept.
pub fn add_capacity_in(mut table: PowerPlantTable) -> PowerPlantTable {
    for plant in table.iter_mut() {
        if plant.capacity_in.is_none() {
            plant.capacity_in = Some(match plant.efficiency {
                Some(eff) if eff > 0.0 => plant.capacity / eff,
                _ => plant.capacity,
            });
        }
    }
    table
}

/// Builds and reads the region-tagged register of the active model-region set
pub struct PowerPlantLoader<'a> {
    config: &'a DeflexConfig,
    regions: &'a dyn RegionProvider,
    source: &'a dyn RegisterSource,
    cache: FileCache,
}

impl<'a> PowerPlantLoader<'a> {
    pub fn new(
        config: &'a DeflexConfig,
        regions: &'a dyn RegionProvider,
        source: &'a dyn RegisterSource,
    ) -> Self {
        Self { config, regions, source, cache: FileCache::new(config) }
    }

    pub fn config(&self) -> &DeflexConfig {
        self.config
    }

    /// Label every plant with its model region and drop the geometry column
    pub fn add_model_region_pp(&self, mut table: PowerPlantTable) -> Result<PowerPlantTable> {
        let regions = self.regions.model_regions(&self.config.map)?;
        let points: Vec<Option<[f64; 2]>> = table.iter().map(|p| p.coordinates()).collect();
        let joined =
            spatial_join_with_buffer(&points, &regions, JoinOptions::from(self.config.spatial_join))?;

        tracing::debug!("Spatial join: {}", joined.summary.to_json());
        for (plant, label) in table.iter_mut().zip(joined.labels) {
            plant.region = label;
            plant.attributes.remove(GEOMETRY_COLUMN);
        }

        tracing::info!("deflex regions added to power plant table.");
        Ok(table)
    }

    /// Create the region-tagged register from the reegis register
    ///
    /// The reegis register is requested from the register source if it does
    /// not exist. The result replaces any existing file; its path is returned.
    pub fn pp_reegis2deflex(&self, clean_offshore: bool) -> Result<PathBuf> {
        let mut filename_in = self.config.reegis_pp_path();
        let filename_out = self.cache.path_for(&CacheKey::deflex_register(&self.config.map));

        if !filename_in.is_file() {
            tracing::debug!(
                "File '{}' does not exist. Will create it from opsd file.",
                filename_in.display()
            );
            filename_in = self.source.create_reegis_register()?;
        }

        let region_column = self.config.region_column();
        let pp = read_register(&filename_in, &region_column)?;
        let pp = self.add_model_region_pp(pp)?;
        let mut pp = add_capacity_in(pp);

        if self.config.powerplants.remove_phes {
            let removed = pp.retain(|p| p.technology != technology::PUMPED_STORAGE);
            tracing::debug!("Removed {} pumped storage plants", removed);
        }

        for state in &self.config.powerplants.remove_states {
            let removed = pp.retain(|p| &p.federal_states != state);
            tracing::debug!("Removed {} plants of state {}", removed, state);
        }

        if clean_offshore {
            remove_onshore_technology_from_offshore_regions(&mut pp, self.config)?;
        }

        write_register(&pp, &filename_out, &region_column)?;
        tracing::info!("Wrote {} plants to {}", pp.len(), filename_out.display());
        Ok(filename_out)
    }

    /// Region-tagged register with the effective capacities of `year`
    ///
    /// By default the `capacity_<year>` columns are added; with
    /// `overwrite_capacity` the base capacity columns are replaced.
    pub fn get_deflex_pp_by_year(
        &self,
        year: i32,
        overwrite_capacity: bool,
    ) -> Result<PowerPlantTable> {
        tracing::info!("Get deflex power plants for {}.", year);
        let key = CacheKey::deflex_register(&self.config.map);
        let filename = self.cache.get_or_create(&key, |_| {
            self.pp_reegis2deflex(self.config.powerplants.clean_offshore).map(|_| ())
        })?;

        let pp = read_register(&filename, &self.config.region_column())?;
        Ok(get_pp_by_year(pp, year, overwrite_capacity, self.config.decommission_proration))
    }
}
