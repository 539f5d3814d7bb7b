//! File-backed implementations of the deflex ports

use chrono::{Datelike, Duration, NaiveDate};
use deflex_core::config::DeflexConfig;
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::{
    FeedinCategory, FeedinTable, LineId, MastrPlant, RegionSet, TurbineDefaults,
};
use deflex_core::ports::{
    CapacityWeights, RegionProvider, RegisterSource, TurbineLibrary, WeatherAggregator,
    WindZoneAssigner,
};
use deflex_geo::index::RegionIndex;
use deflex_geo::regions::{load_named_polygons, load_power_lines_geojson, load_regions_geojson};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

fn open(path: &Path, hint: &str) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            DeflexError::FileNotFound { path: path.to_path_buf(), hint: hint.to_string() }
        }
        _ => DeflexError::Io(e),
    })
}

fn csv_error(e: csv::Error) -> DeflexError {
    DeflexError::Csv(e.to_string())
}

/// Regions and power lines from `<geometries>/<map>_regions.geojson`
/// and `<geometries>/<map>_power_lines.geojson`
pub struct GeoJsonRegions {
    dir: PathBuf,
}

impl GeoJsonRegions {
    pub fn new(config: &DeflexConfig) -> Self {
        Self { dir: config.geometries_dir.clone() }
    }
}

impl RegionProvider for GeoJsonRegions {
    fn model_regions(&self, map: &str) -> Result<RegionSet> {
        let path = self.dir.join(format!("{}_regions.geojson", map));
        load_regions_geojson(&path, map, "region")
    }

    fn power_lines(&self, map: &str) -> Result<Vec<LineId>> {
        let path = self.dir.join(format!("{}_power_lines.geojson", map));
        load_power_lines_geojson(&path, "name")
    }
}

/// A reegis register that has to exist already
pub struct ExistingRegister {
    path: PathBuf,
}

impl ExistingRegister {
    pub fn new(config: &DeflexConfig) -> Self {
        Self { path: config.reegis_pp_path() }
    }
}

impl RegisterSource for ExistingRegister {
    fn create_reegis_register(&self) -> Result<PathBuf> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }
        Err(DeflexError::FileNotFound {
            path: self.path.clone(),
            hint: "Convert the OPSD register to the reegis format first.".to_string(),
        })
    }
}

/// Turbine catalog as CSV with the columns `turbine_type,has_power_curve`
pub struct TurbineLibraryCsv {
    path: PathBuf,
}

impl TurbineLibraryCsv {
    pub fn new(config: &DeflexConfig) -> Self {
        Self { path: config.mastr_dir.join(&config.mastr.turbine_library) }
    }
}

#[derive(Debug, serde::Deserialize)]
struct TurbineRecord {
    turbine_type: String,
    has_power_curve: String,
}

impl TurbineLibrary for TurbineLibraryCsv {
    fn types_with_power_curve(&self) -> Result<BTreeSet<String>> {
        let file = open(&self.path, "Export the turbine library to CSV.")?;
        let mut types = BTreeSet::new();
        for record in csv::Reader::from_reader(file).deserialize() {
            let record: TurbineRecord = record.map_err(csv_error)?;
            let flag = record.has_power_curve.trim().to_lowercase();
            if matches!(flag.as_str(), "true" | "1" | "yes") {
                types.insert(record.turbine_type);
            }
        }
        tracing::debug!("{} turbine types with power curve", types.len());
        Ok(types)
    }
}

/// Wind-zone polygons (property `zone`) with one default turbine per zone
pub struct WindZones {
    index: RegionIndex,
    defaults: BTreeMap<String, TurbineDefaults>,
}

impl WindZones {
    pub fn load(config: &DeflexConfig) -> Result<Self> {
        let path = config.mastr_dir.join(&config.mastr.wind_zones);
        let zones = load_named_polygons(&path, "zone")?;
        let index = RegionIndex::from_regions(&RegionSet::new("wind_zones", zones))?;
        Ok(Self { index, defaults: config.mastr.wind_zone_defaults.clone() })
    }
}

impl WindZoneAssigner for WindZones {
    fn assign(&self, plants: &[MastrPlant]) -> Result<Vec<Option<TurbineDefaults>>> {
        Ok(plants
            .iter()
            .map(|plant| {
                let zone = self.index.locate(plant.coordinates()?)?;
                let defaults = self.defaults.get(zone);
                if defaults.is_none() {
                    tracing::warn!("No default turbine for wind zone {}", zone);
                }
                defaults.cloned()
            })
            .collect())
    }
}

/// Normalised feed-in profile of one weather cell
#[derive(Debug, Clone, Default)]
struct CellProfile {
    time: Vec<String>,
    series: BTreeMap<String, Vec<f64>>,
}

/// Capacity-weighted aggregation of per-cell profiles
///
/// Profiles are read from `<weather>/<year>/<cell>.csv` with a `time`
/// column followed by one column per category (`wind`, `solar`, optionally
/// `hydro`).
pub struct CellProfileAggregator {
    dir: PathBuf,
}

impl CellProfileAggregator {
    pub fn new(config: &DeflexConfig) -> Self {
        Self { dir: config.weather_dir.clone() }
    }

    fn read_profile(&self, year: i32, cell: u32) -> Result<CellProfile> {
        let path = self.dir.join(year.to_string()).join(format!("{}.csv", cell));
        let mut rdr = csv::Reader::from_reader(open(&path, "Weather profiles are missing.")?);
        let headers = rdr.headers().map_err(csv_error)?.clone();

        let mut profile = CellProfile::default();
        for record in rdr.records() {
            let record = record.map_err(csv_error)?;
            for (name, value) in headers.iter().zip(record.iter()) {
                if name == "time" {
                    profile.time.push(value.to_string());
                    continue;
                }
                let value: f64 = value.trim().parse().map_err(|_| DeflexError::InvalidRecord {
                    row: profile.time.len(),
                    reason: format!("{}: '{}' is not a number", path.display(), value),
                })?;
                profile.series.entry(name.to_string()).or_default().push(value);
            }
        }
        Ok(profile)
    }

    /// Weighted mean of one profile column per region
    fn aggregate(
        &self,
        weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        energy_source: &str,
        column: &str,
        weather_year: i32,
    ) -> Result<(Vec<String>, BTreeMap<String, Option<Vec<f64>>>)> {
        let mut profiles: BTreeMap<u32, CellProfile> = BTreeMap::new();
        let mut index: Option<Vec<String>> = None;
        let mut result = BTreeMap::new();

        for region in regions {
            let cells: Vec<(u32, f64)> = weights
                .iter()
                .filter(|((source, r, _), _)| source == energy_source && r == region)
                .map(|((_, _, cell), capacity)| (*cell, *capacity))
                .collect();
            let total: f64 = cells.iter().map(|(_, c)| c).sum();
            if cells.is_empty() || total <= 0.0 {
                result.insert(region.clone(), None);
                continue;
            }

            let mut sum: Vec<f64> = Vec::new();
            for (cell, capacity) in cells {
                if !profiles.contains_key(&cell) {
                    profiles.insert(cell, self.read_profile(weather_year, cell)?);
                }
                let profile = &profiles[&cell];
                let time = index.get_or_insert_with(|| profile.time.clone());
                if profile.time.len() != time.len() {
                    return Err(DeflexError::InvalidRecord {
                        row: cell as usize,
                        reason: format!(
                            "profile of cell {} has {} steps, expected {}",
                            cell,
                            profile.time.len(),
                            time.len()
                        ),
                    });
                }
                let values = profile.series.get(column).cloned().unwrap_or_else(|| {
                    if column == FeedinCategory::Hydro.file_key() {
                        vec![1.0; profile.time.len()]
                    } else {
                        vec![0.0; profile.time.len()]
                    }
                });
                sum.resize(values.len(), 0.0);
                for (acc, v) in sum.iter_mut().zip(values) {
                    *acc += v * capacity;
                }
            }
            result.insert(region.clone(), Some(sum.into_iter().map(|v| v / total).collect()));
        }

        let index = index.unwrap_or_else(|| hourly_index(weather_year));
        Ok((index, result))
    }
}

/// Hourly time labels of a year
fn hourly_index(year: i32) -> Vec<String> {
    let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return Vec::new();
    };
    let mut index = Vec::with_capacity(8784);
    let mut t = start;
    while t.year() == year {
        index.push(t.format("%Y-%m-%d %H:%M").to_string());
        t += Duration::hours(1);
    }
    index
}

fn single_level_table(
    index: Vec<String>,
    series: BTreeMap<String, Option<Vec<f64>>>,
) -> Result<FeedinTable> {
    let len = index.len();
    let mut table = FeedinTable::new(vec!["region".to_string()], index);
    for (region, values) in series {
        table.push_column(vec![region], values.unwrap_or_else(|| vec![0.0; len]))?;
    }
    Ok(table)
}

impl WeatherAggregator for CellProfileAggregator {
    fn wind_solar(
        &self,
        weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        year: i32,
        category: FeedinCategory,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        let weather_year = weather_year.unwrap_or(year);
        let (index, series) = self.aggregate(
            weights,
            regions,
            category.energy_source(),
            category.file_key(),
            weather_year,
        )?;

        let len = index.len();
        let mut table = FeedinTable::new(
            vec!["region".to_string(), "type".to_string(), "weather_year".to_string()],
            index,
        );
        for (region, values) in series {
            table.push_column(
                vec![region, category.file_key().to_string(), weather_year.to_string()],
                values.unwrap_or_else(|| vec![0.0; len]),
            )?;
        }
        Ok(table)
    }

    fn hydro(
        &self,
        weights: &CapacityWeights,
        regions: &BTreeSet<String>,
        year: i32,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        let category = FeedinCategory::Hydro;
        let (index, series) = self.aggregate(
            weights,
            regions,
            category.energy_source(),
            category.file_key(),
            weather_year.unwrap_or(year),
        )?;
        single_level_table(index, series)
    }

    /// Geothermal plants run at a constant rate
    fn geothermal(
        &self,
        regions: &BTreeSet<String>,
        year: i32,
        weather_year: Option<i32>,
    ) -> Result<FeedinTable> {
        let index = hourly_index(weather_year.unwrap_or(year));
        let series = regions.iter().map(|r| (r.clone(), Some(vec![1.0; index.len()]))).collect();
        single_level_table(index, series)
    }
}
