use serde::{Deserialize, Serialize};

/// A prepared row of the MaStR wind register
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MastrPlant {
    pub lat: Option<f64>,
    pub lon: Option<f64>,

    /// Installed capacity
    pub capacity: f64,

    /// Turbine model designation, matched against the power-curve catalog
    pub turbine_type: Option<String>,
    pub hub_height: Option<f64>,
    pub rotor_diameter: Option<f64>,

    pub com_year: Option<i32>,
    pub com_month: Option<u32>,
    pub decom_year: Option<i32>,
    pub decom_month: Option<u32>,

    pub temporary_decom_date: Option<String>,
    pub resumption_date: Option<String>,

    /// Location class ("Lage")
    pub location: Option<String>,

    /// Offshore location ("Seelage")
    pub sea_location: Option<String>,

    /// Whether the turbine type has a known power curve
    pub has_power_curve: bool,
}

impl MastrPlant {
    pub fn coordinates(&self) -> Option<[f64; 2]> {
        match (self.lon, self.lat) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => Some([lon, lat]),
            _ => None,
        }
    }
}

/// Turbine characteristics assumed for a wind zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineDefaults {
    pub turbine_type: String,
    pub hub_height: f64,
    pub rotor_diameter: f64,
}
