use clap::{Parser, Subcommand};
use deflex_core::config::{CliConfigOverrides, DecommissionProration};
use std::path::PathBuf;

/// deflex - Power plants, feed-in and transmission for the deflex model
#[derive(Parser, Debug)]
#[command(name = "deflex")]
#[command(about = "Data preparation for the deflex energy-system model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./deflex.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model-region set, e.g. de21
    #[arg(long, global = true)]
    pub map: Option<String>,

    /// Base directory for relative data paths
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Proration of capacity in the decommissioning year
    #[arg(long, global = true)]
    pub decommission_proration: Option<ProrationArg>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            map: self.map.clone(),
            data_dir: self.data_dir.clone(),
            decommission_proration: self.decommission_proration.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProrationArg {
    /// capacity * com_month / 12
    CommissioningMonth,
    /// capacity * decom_month / 12
    DecommissioningMonth,
}

impl From<ProrationArg> for DecommissionProration {
    fn from(arg: ProrationArg) -> Self {
        match arg {
            ProrationArg::CommissioningMonth => DecommissionProration::CommissioningMonth,
            ProrationArg::DecommissioningMonth => DecommissionProration::DecommissioningMonth,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the region-tagged power-plant register
    Powerplants(PowerplantsArgs),

    /// Show installed capacity per region and energy source for a year
    ByYear(ByYearArgs),

    /// Aggregate or read regional feed-in time series
    Feedin(FeedinArgs),

    /// Derive transmission capacities between model regions
    Transmission(TransmissionArgs),

    /// Prepare the MaStR wind register for a year
    Mastr(MastrArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

#[derive(Parser, Debug)]
pub struct PowerplantsArgs {
    /// Leave onshore technology in offshore regions
    #[arg(long)]
    pub keep_offshore: bool,
}

#[derive(Parser, Debug)]
pub struct ByYearArgs {
    /// Year to apportion capacities for
    pub year: i32,

    /// Replace the capacity columns instead of adding capacity_<year>
    #[arg(long)]
    pub overwrite_capacity: bool,
}

#[derive(Parser, Debug)]
pub struct FeedinArgs {
    /// Year of the power-plant capacities
    pub year: i32,

    /// Take the weather of another year
    #[arg(long)]
    pub weather_year: Option<i32>,

    /// Read one category (wind, solar, hydro, geothermal) instead of aggregating all
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TransmissionArgs {
    /// Add the reverse direction of every line
    #[arg(long)]
    pub duplicate: bool,

    /// Write the lines as CSV to this file
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct MastrArgs {
    /// Year the register is filtered for
    pub year: i32,

    /// Energy source category
    #[arg(long, default_value = "Wind")]
    pub category: String,
}
