//! Feedin command implementation

use crate::adapters::{CellProfileAggregator, ExistingRegister, GeoJsonRegions};
use crate::cli::FeedinArgs;
use crate::output::OutputWriter;
use crate::output_types::{FeedinInfo, FeedinOutput};
use anyhow::Result;
use deflex_core::models::{FeedinCategory, FeedinTable};
use deflex_core::DeflexConfig;
use deflex_data::cache::{CacheKey, FileCache};
use deflex_data::feedin::read_feedin_csv;
use deflex_data::{FeedinAggregator, PowerPlantLoader};

fn info(category: &str, table: &FeedinTable, path: Option<String>) -> FeedinInfo {
    FeedinInfo {
        category: category.to_string(),
        columns: table.columns.len(),
        time_steps: table.len(),
        path,
    }
}

pub fn execute(args: FeedinArgs, config: &DeflexConfig, output: &OutputWriter) -> Result<()> {
    let regions = GeoJsonRegions::new(config);
    let source = ExistingRegister::new(config);
    let loader = PowerPlantLoader::new(config, &regions, &source);
    let weather = CellProfileAggregator::new(config);
    let aggregator = FeedinAggregator::new(config, &weather, &loader);

    let mut series = Vec::new();
    match args.category.as_deref() {
        Some(category) => match aggregator.get_feedin(args.year, category, args.weather_year)? {
            Some(table) => series.push(info(category, &table, None)),
            None => output.warning(format!("No feed-in of type '{}'", category)),
        },
        None => {
            aggregator.aggregate_by_region(args.year, None, args.weather_year)?;
            let cache = FileCache::new(config);
            for category in FeedinCategory::ALL {
                let key = CacheKey::feedin(&config.map, args.year, category, args.weather_year);
                let path = cache.path_for(&key);
                let table = read_feedin_csv(&path, category.header_levels())?;
                series.push(info(
                    category.file_key(),
                    &table,
                    Some(path.display().to_string()),
                ));
            }
        }
    }

    if output.is_json() {
        output.result(FeedinOutput {
            map: config.map.clone(),
            year: args.year,
            weather_year: args.weather_year,
            series,
        })?;
    } else if !series.is_empty() {
        output.section(format!("Feed-in {} ({})", args.year, config.map));
        if let Some(weather_year) = args.weather_year {
            output.kv("Weather year", weather_year);
        }
        output.table(series);
    }
    Ok(())
}
