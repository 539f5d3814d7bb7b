//! Powerplants command implementation

use super::{capacity_rows, map_label};
use crate::adapters::{ExistingRegister, GeoJsonRegions};
use crate::cli::PowerplantsArgs;
use crate::output::OutputWriter;
use crate::output_types::PowerplantsOutput;
use anyhow::{Context, Result};
use deflex_core::DeflexConfig;
use deflex_data::register::read_register;
use deflex_data::PowerPlantLoader;

pub fn execute(args: PowerplantsArgs, config: &DeflexConfig, output: &OutputWriter) -> Result<()> {
    let regions = GeoJsonRegions::new(config);
    let source = ExistingRegister::new(config);
    let loader = PowerPlantLoader::new(config, &regions, &source);

    let path = loader
        .pp_reegis2deflex(!args.keep_offshore && config.powerplants.clean_offshore)
        .context("Failed to build the deflex power-plant register")?;
    let table = read_register(&path, &config.region_column())?;
    let capacity = capacity_rows(table.capacity_by_region_and_source());

    if output.is_json() {
        output.result(PowerplantsOutput {
            map: config.map.clone(),
            path: path.display().to_string(),
            plant_count: table.len(),
            capacity,
        })?;
    } else {
        output.success(format!("Wrote {} power plants to {}", table.len(), path.display()));
        output.section(format!("Installed capacity, {}", map_label(config)));
        output.table(capacity);
    }
    Ok(())
}
