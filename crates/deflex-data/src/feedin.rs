//! Aggregating feed-in time series for the model regions

use crate::cache::{CacheKey, FileCache};
use crate::powerplants::PowerPlantLoader;
use deflex_core::config::DeflexConfig;
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::{FeedinCategory, FeedinTable, PowerPlantTable};
use deflex_core::ports::{CapacityWeights, WeatherAggregator};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Capacity per (energy source, region, weather cell)
///
/// Uses the `capacity_<year>` values where present and the base capacity
/// otherwise. Plants without region or weather cell are left out.
pub fn capacity_weights(table: &PowerPlantTable, year: i32) -> CapacityWeights {
    let mut weights = CapacityWeights::new();
    for plant in table.iter() {
        let (Some(region), Some(cell)) = (plant.region.as_ref(), plant.coastdat2) else {
            continue;
        };
        let capacity = plant.yearly.get(&year).map_or(plant.capacity, |y| y.capacity);
        *weights
            .entry((plant.energy_source_level_2.clone(), region.clone(), cell))
            .or_insert(0.0) += capacity;
    }
    weights
}

/// Sorted region labels of a weighting table
pub fn weight_regions(weights: &CapacityWeights) -> BTreeSet<String> {
    weights.keys().map(|(_, region, _)| region.clone()).collect()
}

fn csv_error(e: csv::Error) -> DeflexError {
    DeflexError::Csv(e.to_string())
}

/// Every column needs one label per header level and one value per time step
fn check_shape(table: &FeedinTable) -> Result<()> {
    for (col, column) in table.columns.iter().enumerate() {
        if column.labels.len() != table.levels() || column.values.len() != table.len() {
            return Err(DeflexError::InvalidRecord {
                row: col,
                reason: format!(
                    "feed-in column {:?} has {} labels and {} values, expected {} and {}",
                    column.labels,
                    column.labels.len(),
                    column.values.len(),
                    table.levels(),
                    table.len()
                ),
            });
        }
    }
    Ok(())
}

/// Write a feed-in table with one header row per level
///
/// Each header row starts with the level name, each data row with the
/// time index label. Ragged tables are rejected before anything is written.
pub fn write_feedin_to(table: &FeedinTable, writer: impl Write) -> Result<()> {
    check_shape(table)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for (level, name) in table.level_names.iter().enumerate() {
        let mut row = vec![name.clone()];
        row.extend(table.columns.iter().filter_map(|c| c.labels.get(level).cloned()));
        wtr.write_record(&row).map_err(csv_error)?;
    }
    for (i, label) in table.index.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(table.columns.iter().filter_map(|c| c.values.get(i).map(f64::to_string)));
        wtr.write_record(&row).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_feedin_csv(table: &FeedinTable, path: &Path) -> Result<()> {
    check_shape(table)?;
    write_feedin_to(table, io::BufWriter::new(File::create(path)?))
}

/// Read a feed-in table with `levels` header rows
pub fn read_feedin_from(reader: impl Read, levels: usize) -> Result<FeedinTable> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(reader);
    let mut records = rdr.records();

    let mut level_names = Vec::with_capacity(levels);
    let mut labels: Vec<Vec<String>> = Vec::new();
    for level in 0..levels {
        let record = records
            .next()
            .ok_or_else(|| DeflexError::Csv(format!("feed-in file ends in header row {}", level)))?
            .map_err(csv_error)?;
        let mut fields = record.iter();
        level_names.push(fields.next().unwrap_or_default().to_string());
        for (col, label) in fields.enumerate() {
            if level == 0 {
                labels.push(Vec::with_capacity(levels));
            }
            labels
                .get_mut(col)
                .ok_or_else(|| DeflexError::Csv(format!("header row {} is too long", level)))?
                .push(label.to_string());
        }
    }

    let mut index = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
    for (row, record) in records.enumerate() {
        let record = record.map_err(csv_error)?;
        let mut fields = record.iter();
        index.push(fields.next().unwrap_or_default().to_string());
        for (col, value) in fields.enumerate() {
            let value = value.trim();
            let parsed = if value.is_empty() {
                f64::NAN
            } else {
                value.parse().map_err(|_| DeflexError::InvalidRecord {
                    row,
                    reason: format!("feed-in value is not a number: '{}'", value),
                })?
            };
            values
                .get_mut(col)
                .ok_or_else(|| DeflexError::InvalidRecord {
                    row,
                    reason: "more values than header columns".to_string(),
                })?
                .push(parsed);
        }
    }

    let mut table = FeedinTable::new(level_names, index);
    for (labels, values) in labels.into_iter().zip(values) {
        table.push_column(labels, values)?;
    }
    Ok(table)
}

pub fn read_feedin_csv(path: &Path, levels: usize) -> Result<FeedinTable> {
    read_feedin_from(File::open(path)?, levels)
}

/// Produces and retrieves the region feed-in files of the active model-region set
pub struct FeedinAggregator<'a> {
    config: &'a DeflexConfig,
    aggregator: &'a dyn WeatherAggregator,
    loader: &'a PowerPlantLoader<'a>,
    cache: FileCache,
}

impl<'a> FeedinAggregator<'a> {
    pub fn new(
        config: &'a DeflexConfig,
        aggregator: &'a dyn WeatherAggregator,
        loader: &'a PowerPlantLoader<'a>,
    ) -> Self {
        Self { config, aggregator, loader, cache: FileCache::new(config) }
    }

    /// Capacity weights of the plants in service in `year`
    pub fn get_grouped_power_plants(&self, year: i32) -> Result<CapacityWeights> {
        let pp = self.loader.get_deflex_pp_by_year(year, false)?;
        Ok(capacity_weights(&pp, year))
    }

    fn key(&self, year: i32, category: FeedinCategory, weather_year: Option<i32>) -> CacheKey {
        CacheKey::feedin(&self.config.map, year, category, weather_year)
    }

    /// Write the feed-in files of all categories that do not exist yet
    ///
    /// `plants` replaces the register of `year` as capacity source.
    pub fn aggregate_by_region(
        &self,
        year: i32,
        plants: Option<&PowerPlantTable>,
        weather_year: Option<i32>,
    ) -> Result<()> {
        let weights = match plants {
            Some(pp) => capacity_weights(pp, year),
            None => self.get_grouped_power_plants(year)?,
        };
        let regions = weight_regions(&weights);
        tracing::info!(
            "Aggregating feed-in of {} for {} regions (weather year {:?})",
            year,
            regions.len(),
            weather_year
        );

        for category in FeedinCategory::ALL {
            let key = self.key(year, category, weather_year);
            self.cache.get_or_create(&key, |path| {
                tracing::debug!("Aggregating {} feed-in into {}", category, path.display());
                let table = match category {
                    FeedinCategory::Wind | FeedinCategory::Solar => self.aggregator.wind_solar(
                        &weights,
                        &regions,
                        year,
                        category,
                        weather_year,
                    )?,
                    FeedinCategory::Hydro => {
                        self.aggregator.hydro(&weights, &regions, year, weather_year)?
                    }
                    FeedinCategory::Geothermal => {
                        self.aggregator.geothermal(&regions, year, weather_year)?
                    }
                };
                write_feedin_csv(&table, path)
            })?;
        }
        Ok(())
    }

    /// Feed-in series of one category, aggregated on a cache miss
    ///
    /// Returns `None` for an unknown feed-in type.
    pub fn get_feedin(
        &self,
        year: i32,
        feedin_type: &str,
        weather_year: Option<i32>,
    ) -> Result<Option<FeedinTable>> {
        let Some(category) = FeedinCategory::from_name(feedin_type) else {
            tracing::debug!("No feed-in of type '{}'", feedin_type);
            return Ok(None);
        };

        let key = self.key(year, category, weather_year);
        let path =
            self.cache.get_or_create(&key, |_| self.aggregate_by_region(year, None, weather_year))?;
        read_feedin_csv(&path, category.header_levels()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deflex_core::models::{FeedinColumn, PowerPlant, YearCapacity};

    fn plant(source: &str, region: Option<&str>, cell: Option<u32>, capacity: f64) -> PowerPlant {
        PowerPlant {
            energy_source_level_2: source.to_string(),
            region: region.map(str::to_string),
            coastdat2: cell,
            capacity,
            ..Default::default()
        }
    }

    #[test]
    fn test_capacity_weights_group_by_cell() {
        let mut built = plant("Wind", Some("DE01"), Some(7), 3.0);
        built.yearly.insert(2014, YearCapacity { capacity: 1.5, capacity_in: 1.5 });
        let table = PowerPlantTable::new(vec![
            plant("Wind", Some("DE01"), Some(7), 2.0),
            built,
            plant("Wind", Some("DE02"), Some(7), 4.0),
            plant("Solar", None, Some(7), 9.0),
            plant("Solar", Some("DE02"), None, 9.0),
        ]);

        let weights = capacity_weights(&table, 2014);
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[&("Wind".to_string(), "DE01".to_string(), 7)], 3.5);
        assert_eq!(
            weight_regions(&weights).into_iter().collect::<Vec<_>>(),
            vec!["DE01", "DE02"]
        );
    }

    #[test]
    fn test_multi_level_csv() {
        let mut table = FeedinTable::new(
            vec!["region".to_string(), "type".to_string(), "set".to_string()],
            vec!["2014-01-01 00:00".to_string(), "2014-01-01 01:00".to_string()],
        );
        table
            .push_column(
                vec!["DE01".to_string(), "wind".to_string(), "E-82".to_string()],
                vec![0.25, 0.5],
            )
            .unwrap();

        let mut buf = Vec::new();
        write_feedin_to(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("region,DE01\ntype,wind\nset,E-82\n"));

        let read = read_feedin_from(text.as_bytes(), 3).unwrap();
        assert_eq!(read.column(&["DE01", "wind", "E-82"]), Some(&[0.25, 0.5][..]));
    }

    #[test]
    fn test_ragged_table_is_rejected() {
        let mut table = FeedinTable::new(
            vec!["region".to_string()],
            vec!["2014-01-01 00:00".to_string(), "2014-01-01 01:00".to_string()],
        );
        table.columns.push(FeedinColumn { labels: vec!["DE01".to_string()], values: vec![0.5] });

        let mut buf = Vec::new();
        let err = write_feedin_to(&table, &mut buf).unwrap_err();
        assert!(matches!(err, DeflexError::InvalidRecord { row: 0, .. }));
        assert!(buf.is_empty());

        // No half-written file that a later cache lookup would pick up
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ragged.csv");
        assert!(write_feedin_csv(&table, &path).is_err());
        assert!(!path.exists());

        table.columns[0].values.push(0.25);
        table.columns[0].labels.push("extra".to_string());
        assert!(write_feedin_to(&table, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_single_level_csv() {
        let data = "region,DE01,DE02\n2014-01-01 00:00,0.1,0.2\n";
        let table = read_feedin_from(data.as_bytes(), 1).unwrap();
        assert_eq!(table.levels(), 1);
        assert_eq!(table.column(&["DE02"]), Some(&[0.2][..]));
    }
}
