use serde::Serialize;
use tabled::Tabled;

/// Output for powerplants command
#[derive(Debug, Serialize)]
pub struct PowerplantsOutput {
    pub map: String,
    pub path: String,
    pub plant_count: usize,
    pub capacity: Vec<CapacityRow>,
}

/// Installed capacity of one energy source in one region
#[derive(Debug, Serialize, Tabled)]
pub struct CapacityRow {
    pub region: String,
    pub energy_source: String,
    #[tabled(display_with = "display_capacity")]
    pub capacity: f64,
}

fn display_capacity(value: &f64) -> String {
    format!("{:.1}", value)
}

/// Output for by-year command
#[derive(Debug, Serialize)]
pub struct ByYearOutput {
    pub map: String,
    pub year: i32,
    pub overwrite_capacity: bool,
    pub plant_count: usize,
    pub capacity: Vec<CapacityRow>,
}

/// Output for feedin command
#[derive(Debug, Serialize)]
pub struct FeedinOutput {
    pub map: String,
    pub year: i32,
    pub weather_year: Option<i32>,
    pub series: Vec<FeedinInfo>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct FeedinInfo {
    pub category: String,
    pub columns: usize,
    pub time_steps: usize,
    #[tabled(display_with = "display_option")]
    pub path: Option<String>,
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

/// Output for transmission command
#[derive(Debug, Serialize)]
pub struct TransmissionOutput {
    pub map: String,
    pub renpass: bool,
    pub duplicate: bool,
    pub lines: Vec<LineRow>,
    pub written_to: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct LineRow {
    pub line: String,
    /// `None` stands for unlimited capacity
    #[tabled(display_with = "display_unlimited")]
    pub capacity: Option<f64>,
    #[tabled(display_with = "display_number")]
    pub distance: Option<f64>,
    #[tabled(display_with = "display_number")]
    pub efficiency: Option<f64>,
}

fn display_unlimited(value: &Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "inf".to_string())
}

fn display_number(value: &Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Output for mastr command
#[derive(Debug, Serialize)]
pub struct MastrOutput {
    pub category: String,
    pub year: i32,
    pub plant_count: usize,
    pub capacity: f64,
    pub with_power_curve: usize,
    pub turbine_types: Vec<TurbineRow>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct TurbineRow {
    pub turbine_type: String,
    pub plants: usize,
    #[tabled(display_with = "display_capacity")]
    pub capacity: f64,
}

/// Output for config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
