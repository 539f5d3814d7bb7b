//! MaStR command implementation

use crate::adapters::{TurbineLibraryCsv, WindZones};
use crate::cli::MastrArgs;
use crate::output::OutputWriter;
use crate::output_types::{MastrOutput, TurbineRow};
use anyhow::Result;
use deflex_core::DeflexConfig;
use deflex_data::{MastrCategory, MastrPreparer};
use std::collections::BTreeMap;

pub fn execute(args: MastrArgs, config: &DeflexConfig, output: &OutputWriter) -> Result<()> {
    MastrCategory::from_name(&args.category)?;
    let turbines = TurbineLibraryCsv::new(config);
    let zones = WindZones::load(config)?;
    let preparer = MastrPreparer::new(config, &turbines, &zones);
    let plants = preparer.get_mastr_pp_filtered_by_year(&args.category, args.year)?;

    let mut by_type: BTreeMap<String, (usize, f64)> = BTreeMap::new();
    for plant in &plants {
        let turbine_type = plant.turbine_type.clone().unwrap_or_else(|| "unknown".to_string());
        let entry = by_type.entry(turbine_type).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += plant.capacity;
    }
    let turbine_types: Vec<TurbineRow> = by_type
        .into_iter()
        .map(|(turbine_type, (plants, capacity))| TurbineRow { turbine_type, plants, capacity })
        .collect();

    let capacity: f64 = plants.iter().map(|p| p.capacity).sum();
    let with_power_curve = plants.iter().filter(|p| p.has_power_curve).count();

    if output.is_json() {
        output.result(MastrOutput {
            category: args.category,
            year: args.year,
            plant_count: plants.len(),
            capacity,
            with_power_curve,
            turbine_types,
        })?;
    } else {
        output.section(format!("MaStR {} plants in {}", args.category, args.year));
        output.kv("Plants", plants.len());
        output.kv("Capacity", format!("{:.1}", capacity));
        output.kv("With power curve", with_power_curve);
        output.table(turbine_types);
    }
    Ok(())
}
