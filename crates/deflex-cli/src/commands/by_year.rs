//! By-year command implementation

use super::{capacity_rows, map_label};
use crate::adapters::{ExistingRegister, GeoJsonRegions};
use crate::cli::ByYearArgs;
use crate::output::OutputWriter;
use crate::output_types::ByYearOutput;
use anyhow::Result;
use deflex_core::DeflexConfig;
use deflex_data::PowerPlantLoader;

pub fn execute(args: ByYearArgs, config: &DeflexConfig, output: &OutputWriter) -> Result<()> {
    let regions = GeoJsonRegions::new(config);
    let source = ExistingRegister::new(config);
    let loader = PowerPlantLoader::new(config, &regions, &source);

    let table = loader.get_deflex_pp_by_year(args.year, args.overwrite_capacity)?;
    let year = args.year;
    let groups = table.sum_by(
        |p| (p.region.clone().unwrap_or_default(), p.energy_source_level_2.clone()),
        |p| {
            if args.overwrite_capacity {
                p.capacity
            } else {
                p.capacity_for(year).capacity
            }
        },
    );
    let capacity = capacity_rows(groups);

    if output.is_json() {
        output.result(ByYearOutput {
            map: config.map.clone(),
            year,
            overwrite_capacity: args.overwrite_capacity,
            plant_count: table.len(),
            capacity,
        })?;
    } else {
        output.section(format!("Capacity in {}, {}", year, map_label(config)));
        output.kv("Power plants", table.len());
        output.table(capacity);
    }
    Ok(())
}
