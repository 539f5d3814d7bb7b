//! Preparation of the MaStR (Marktstammdatenregister) wind register

use crate::apportion::apportion_year;
use crate::apportion::ServicePeriod;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use deflex_core::config::DeflexConfig;
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::MastrPlant;
use deflex_core::ports::{TurbineLibrary, WindZoneAssigner};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Register columns read for wind plants
pub const WIND_COLUMNS: [&str; 14] = [
    "Nabenhoehe",
    "Rotordurchmesser",
    "Typenbezeichnung",
    "Laengengrad",
    "Breitengrad",
    "Inbetriebnahmedatum",
    "DatumEndgueltigeStilllegung",
    "DatumBeginnVoruebergehendeStilllegung",
    "DatumWiederaufnahmeBetrieb",
    "Lage",
    "InstallierteLeistung",
    "Seelage",
    "lat",
    "lon",
];

/// A raw register row, restricted to the allowlisted columns
pub type MastrRecord = BTreeMap<String, String>;

/// Energy source categories with MaStR data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MastrCategory {
    Wind,
}

impl MastrCategory {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Wind" => Ok(MastrCategory::Wind),
            "Solar" => Err(DeflexError::CategoryNotAdded { category: name.to_string() }),
            _ => Err(DeflexError::UnsupportedCategory {
                category: name.to_string(),
                options: vec!["Wind".to_string()],
            }),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            MastrCategory::Wind => &WIND_COLUMNS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MastrCategory::Wind => "Wind",
        }
    }
}

/// Read the allowlisted columns of a MaStR register file
pub fn load_mastr_from_file(path: &Path, category: MastrCategory) -> Result<Vec<MastrRecord>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeflexError::FileNotFound {
            path: path.to_path_buf(),
            hint: "Check MaStR file location.".to_string(),
        },
        _ => DeflexError::Io(e),
    })?;
    let records = read_mastr_records(file, category)?;
    tracing::info!("Read {} {} units from {}", records.len(), category.name(), path.display());
    Ok(records)
}

pub fn read_mastr_records(reader: impl Read, category: MastrCategory) -> Result<Vec<MastrRecord>> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers().map_err(|e| DeflexError::Csv(e.to_string()))?.clone();

    let mut positions = Vec::with_capacity(category.columns().len());
    for column in category.columns() {
        let pos = headers.iter().position(|h| h == *column).ok_or_else(|| {
            DeflexError::Csv(format!("MaStR register has no column '{}'", column))
        })?;
        positions.push((*column, pos));
    }

    rdr.records()
        .map(|record| {
            let record = record.map_err(|e| DeflexError::Csv(e.to_string()))?;
            Ok(positions
                .iter()
                .map(|(column, pos)| {
                    (column.to_string(), record.get(*pos).unwrap_or_default().to_string())
                })
                .collect())
        })
        .collect()
}

/// Parse a register date, ignoring any time of day
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(value, "%d.%m.%Y").ok())
}

fn number(record: &MastrRecord, column: &str, row: usize) -> Result<Option<f64>> {
    let value = record.get(column).map(|v| v.trim()).unwrap_or_default();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| DeflexError::InvalidRecord {
        row,
        reason: format!("{} is not a number: '{}'", column, value),
    })
}

fn text(record: &MastrRecord, column: &str) -> Option<String> {
    record.get(column).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn date(record: &MastrRecord, column: &str, row: usize) -> Result<Option<NaiveDate>> {
    match text(record, column) {
        None => Ok(None),
        Some(value) => parse_date(&value).map(Some).ok_or_else(|| DeflexError::InvalidRecord {
            row,
            reason: format!("{} is not a date: '{}'", column, value),
        }),
    }
}

/// Translate raw rows into [`MastrPlant`]s
///
/// Commissioning and decommissioning dates are split into year and month.
/// Coordinates come from `lat`/`lon`, falling back to `Breitengrad`/`Laengengrad`.
pub fn prepare_mastr_data(
    records: Vec<MastrRecord>,
    category: MastrCategory,
) -> Result<Vec<MastrPlant>> {
    match category {
        MastrCategory::Wind => records
            .iter()
            .enumerate()
            .map(|(row, r)| {
                let com = date(r, "Inbetriebnahmedatum", row)?;
                let decom = date(r, "DatumEndgueltigeStilllegung", row)?;
                Ok(MastrPlant {
                    lat: number(r, "lat", row)?.or(number(r, "Breitengrad", row)?),
                    lon: number(r, "lon", row)?.or(number(r, "Laengengrad", row)?),
                    capacity: number(r, "InstallierteLeistung", row)?.unwrap_or(0.0),
                    turbine_type: text(r, "Typenbezeichnung"),
                    hub_height: number(r, "Nabenhoehe", row)?,
                    rotor_diameter: number(r, "Rotordurchmesser", row)?,
                    com_year: com.map(|d| d.year()),
                    com_month: com.map(|d| d.month()),
                    decom_year: decom.map(|d| d.year()),
                    decom_month: decom.map(|d| d.month()),
                    temporary_decom_date: text(r, "DatumBeginnVoruebergehendeStilllegung"),
                    resumption_date: text(r, "DatumWiederaufnahmeBetrieb"),
                    location: text(r, "Lage"),
                    sea_location: text(r, "Seelage"),
                    has_power_curve: false,
                })
            })
            .collect(),
    }
}

/// Keep plants with capacity in `year`, with the capacity set to the effective value
pub fn filter_by_year(
    plants: Vec<MastrPlant>,
    year: i32,
    config: &DeflexConfig,
) -> Vec<MastrPlant> {
    plants
        .into_iter()
        .filter_map(|mut plant| {
            let period = ServicePeriod {
                com_year: plant.com_year,
                com_month: plant.com_month,
                decom_year: plant.decom_year,
                decom_month: plant.decom_month,
            };
            plant.capacity =
                apportion_year(plant.capacity, &period, year, config.decommission_proration);
            (plant.capacity > 0.0).then_some(plant)
        })
        .collect()
}

/// Drop plants without usable coordinates
pub fn remove_pp_with_missing_coordinates(
    plants: Vec<MastrPlant>,
    category: MastrCategory,
    register_name: &str,
) -> Vec<MastrPlant> {
    let before = plants.len();
    let plants: Vec<MastrPlant> =
        plants.into_iter().filter(|p| p.coordinates().is_some()).collect();
    let removed = before - plants.len();
    if removed > 0 {
        tracing::warn!(
            "{} of {} {} {} power plants have no coordinates and are removed",
            removed,
            before,
            register_name,
            category.name()
        );
    }
    plants
}

/// Year-filtered MaStR register with turbine data fit for feed-in calculation
pub struct MastrPreparer<'a> {
    config: &'a DeflexConfig,
    turbines: &'a dyn TurbineLibrary,
    zones: &'a dyn WindZoneAssigner,
}

impl<'a> MastrPreparer<'a> {
    pub fn new(
        config: &'a DeflexConfig,
        turbines: &'a dyn TurbineLibrary,
        zones: &'a dyn WindZoneAssigner,
    ) -> Self {
        Self { config, turbines, zones }
    }

    /// Load, prepare and filter the register for `year`
    ///
    /// Plants whose turbine type has no known power curve get the turbine
    /// type, hub height and rotor diameter of their wind zone. Plants outside
    /// every wind zone keep their own values.
    pub fn get_mastr_pp_filtered_by_year(
        &self,
        energy_source: &str,
        year: i32,
    ) -> Result<Vec<MastrPlant>> {
        let category = MastrCategory::from_name(energy_source)?;
        let records = load_mastr_from_file(&self.config.mastr_wind_path(), category)?;
        let prepared = prepare_mastr_data(records, category)?;
        let filtered = filter_by_year(prepared, year, self.config);
        let mut plants = remove_pp_with_missing_coordinates(filtered, category, "MaStR");

        let with_curve = self.turbines.types_with_power_curve()?;
        for plant in plants.iter_mut() {
            plant.has_power_curve =
                plant.turbine_type.as_ref().is_some_and(|t| with_curve.contains(t));
        }

        let defaults = self.zones.assign(&plants)?;
        if defaults.len() != plants.len() {
            return Err(DeflexError::InvalidRecord {
                row: defaults.len(),
                reason: format!(
                    "wind zone assignment returned {} rows for {} plants",
                    defaults.len(),
                    plants.len()
                ),
            });
        }

        let mut substituted = 0;
        let mut without_zone = 0;
        for (plant, default) in plants.iter_mut().zip(defaults) {
            if plant.has_power_curve {
                continue;
            }
            match default {
                Some(default) => {
                    plant.turbine_type = Some(default.turbine_type);
                    plant.hub_height = Some(default.hub_height);
                    plant.rotor_diameter = Some(default.rotor_diameter);
                    substituted += 1;
                }
                None => without_zone += 1,
            }
        }

        tracing::info!(
            "{} of {} MaStR plants got wind zone turbine data for {}",
            substituted,
            plants.len(),
            year
        );
        if without_zone > 0 {
            tracing::warn!("{} plants without power curve lie outside every wind zone", without_zone);
        }
        Ok(plants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTER: &str = "\
Nabenhoehe,Rotordurchmesser,HerstellerName,Typenbezeichnung,Laengengrad,Breitengrad,Inbetriebnahmedatum,DatumEndgueltigeStilllegung,DatumBeginnVoruebergehendeStilllegung,DatumWiederaufnahmeBetrieb,Lage,InstallierteLeistung,Seelage,lat,lon
100,82,Enercon,E-82 E2,12.1,53.5,2010-06-15,,,,Windkraft an Land,2300,,53.5,12.1
,,Vestas,V90,,,2012-01-01 00:00:00,2014-03-31,,,Windkraft an Land,2000,,,
";

    #[test]
    fn test_category_lookup() {
        assert_eq!(MastrCategory::from_name("Wind").unwrap(), MastrCategory::Wind);
        assert!(matches!(
            MastrCategory::from_name("Solar"),
            Err(DeflexError::CategoryNotAdded { .. })
        ));
        let err = MastrCategory::from_name("Biomass").unwrap_err();
        assert_eq!(err.to_string(), "Category Biomass not existent. Choose from: Wind");
    }

    #[test]
    fn test_prepare_renames_and_splits_dates() {
        let records = read_mastr_records(REGISTER.as_bytes(), MastrCategory::Wind).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].contains_key("HerstellerName"));

        let plants = prepare_mastr_data(records, MastrCategory::Wind).unwrap();
        assert_eq!(plants[0].turbine_type.as_deref(), Some("E-82 E2"));
        assert_eq!(plants[0].hub_height, Some(100.0));
        assert_eq!((plants[0].com_year, plants[0].com_month), (Some(2010), Some(6)));
        assert_eq!(plants[0].decom_year, None);
        assert_eq!((plants[1].decom_year, plants[1].decom_month), (Some(2014), Some(3)));
        assert_eq!(plants[1].coordinates(), None);
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let data = "Nabenhoehe,lat,lon\n100,53.0,12.0\n";
        assert!(read_mastr_records(data.as_bytes(), MastrCategory::Wind).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2014, 3, 31);
        assert_eq!(parse_date("2014-03-31"), expected);
        assert_eq!(parse_date("2014-03-31 12:00:00"), expected);
        assert_eq!(parse_date("31.03.2014"), expected);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_filter_and_coordinates() {
        let config = DeflexConfig::defaults().unwrap();
        let records = read_mastr_records(REGISTER.as_bytes(), MastrCategory::Wind).unwrap();
        let plants = prepare_mastr_data(records, MastrCategory::Wind).unwrap();

        // Second plant was decommissioned in 2014
        let in_2016 = filter_by_year(plants.clone(), 2016, &config);
        assert_eq!(in_2016.len(), 1);

        let in_2013 = filter_by_year(plants, 2013, &config);
        assert_eq!(in_2013.len(), 2);
        let located = remove_pp_with_missing_coordinates(in_2013, MastrCategory::Wind, "MaStR");
        assert_eq!(located.len(), 1);
    }

    #[test]
    fn test_decommissioned_without_commissioning_date_is_dropped() {
        let config = DeflexConfig::defaults().unwrap();
        let plant = MastrPlant {
            capacity: 2000.0,
            com_year: None,
            decom_year: Some(2014),
            decom_month: Some(3),
            ..Default::default()
        };
        assert!(filter_by_year(vec![plant.clone()], 2014, &config).is_empty());
        assert!(filter_by_year(vec![plant], 2012, &config).is_empty());
    }

    #[test]
    fn test_missing_file_hint() {
        let err = load_mastr_from_file(Path::new("/nonexistent/mastr.csv"), MastrCategory::Wind)
            .unwrap_err();
        assert!(err.to_string().contains("Check MaStR file location."));
    }
}
