//! Command implementations

mod by_year;
mod config;
mod feedin;
mod mastr;
mod powerplants;
mod transmission;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::CapacityRow;
use anyhow::{Context, Result};
use deflex_core::DeflexConfig;
use std::collections::BTreeMap;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let layered = load_config(cli.config.as_deref(), cli.overrides())?;

    if let Commands::Config = cli.command {
        return config::execute(&layered, &output);
    }

    let config = layered.resolve().context("Invalid configuration")?;
    match cli.command {
        Commands::Powerplants(args) => powerplants::execute(args, &config, &output),
        Commands::ByYear(args) => by_year::execute(args, &config, &output),
        Commands::Feedin(args) => feedin::execute(args, &config, &output),
        Commands::Transmission(args) => transmission::execute(args, &config, &output),
        Commands::Mastr(args) => mastr::execute(args, &config, &output),
        Commands::Config => config::execute(&layered, &output),
    }
}

/// Rows of a (region, energy source) capacity summary
fn capacity_rows(groups: BTreeMap<(String, String), f64>) -> Vec<CapacityRow> {
    groups
        .into_iter()
        .map(|((region, energy_source), capacity)| CapacityRow {
            region: if region.is_empty() { "-".to_string() } else { region },
            energy_source,
            capacity,
        })
        .collect()
}

fn map_label(config: &DeflexConfig) -> String {
    format!("{} ({})", config.map, config.region_column())
}
