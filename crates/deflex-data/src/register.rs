//! CSV persistence of power-plant registers
//!
//! One register per file, one row per plant. Typed columns are parsed into
//! [`PowerPlant`] fields, derived `capacity_<year>` / `capacity_in_<year>`
//! columns into [`PowerPlant::yearly`], and everything else is carried
//! through verbatim.

use deflex_core::error::{DeflexError, Result};
use deflex_core::models::{PowerPlant, PowerPlantTable, YearCapacity};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

const TYPED_COLUMNS: [&str; 14] = [
    "id",
    "lat",
    "lon",
    "energy_source_level_2",
    "technology",
    "federal_states",
    "capacity",
    "capacity_in",
    "efficiency",
    "com_year",
    "com_month",
    "decom_year",
    "decom_month",
    "coastdat2",
];

/// Kind of a register column
#[derive(Debug, Clone, PartialEq)]
enum Column {
    Typed(&'static str),
    Region,
    YearCapacity(i32),
    YearCapacityIn(i32),
    Attribute(String),
}

fn classify(name: &str, region_column: &str) -> Column {
    if name == region_column {
        return Column::Region;
    }
    if let Some(typed) = TYPED_COLUMNS.iter().find(|c| **c == name) {
        return Column::Typed(typed);
    }
    if let Some(year) = name.strip_prefix("capacity_in_").and_then(|y| y.parse().ok()) {
        return Column::YearCapacityIn(year);
    }
    if let Some(year) = name.strip_prefix("capacity_").and_then(|y| y.parse().ok()) {
        return Column::YearCapacity(year);
    }
    Column::Attribute(name.to_string())
}

fn parse_f64(value: &str, row: usize, column: &str) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value.parse::<f64>().map(Some).map_err(|_| DeflexError::InvalidRecord {
        row,
        reason: format!("{} is not a number: '{}'", column, value),
    })
}

/// Integers may come as "2010" or "2010.0"; values outside the range of `T` are rejected
fn parse_int<T: TryFrom<i64>>(value: &str, row: usize, column: &str) -> Result<Option<T>> {
    let invalid = |reason: String| DeflexError::InvalidRecord { row, reason };
    match parse_f64(value, row, column)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&v) => {
            T::try_from(v as i64)
                .map(Some)
                .map_err(|_| invalid(format!("{} out of range: {}", column, v)))
        }
        Some(v) => Err(invalid(format!("{} is not an integer: {}", column, v))),
    }
}

fn parse_month(value: &str, row: usize, column: &str) -> Result<Option<u32>> {
    match parse_int::<u32>(value, row, column)? {
        None => Ok(None),
        Some(m) if (1..=12).contains(&m) => Ok(Some(m)),
        Some(m) => Err(DeflexError::InvalidRecord {
            row,
            reason: format!("{} out of range: {}", column, m),
        }),
    }
}

fn csv_error(e: csv::Error) -> DeflexError {
    DeflexError::Csv(e.to_string())
}

/// Read a register from a CSV file
pub fn read_register(path: &Path, region_column: &str) -> Result<PowerPlantTable> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeflexError::FileNotFound {
            path: path.to_path_buf(),
            hint: "Create the register first.".to_string(),
        },
        _ => DeflexError::Io(e),
    })?;
    let table = read_register_from(file, region_column)?;
    tracing::debug!("Read {} plants from {}", table.len(), path.display());
    Ok(table)
}

/// Read a register from any CSV source
pub fn read_register_from(reader: impl Read, region_column: &str) -> Result<PowerPlantTable> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let columns: Vec<Column> =
        rdr.headers().map_err(csv_error)?.iter().map(|h| classify(h, region_column)).collect();

    if !columns.contains(&Column::Typed("capacity")) || !columns.contains(&Column::Typed("com_year"))
    {
        return Err(DeflexError::Csv(
            "register needs at least the columns capacity and com_year".to_string(),
        ));
    }

    let mut plants = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let mut plant = PowerPlant { id: row.to_string(), ..Default::default() };
        let mut capacity = None;

        for (column, value) in columns.iter().zip(record.iter()) {
            match column {
                Column::Typed("id") => plant.id = value.to_string(),
                Column::Typed("lat") => plant.lat = parse_f64(value, row, "lat")?,
                Column::Typed("lon") => plant.lon = parse_f64(value, row, "lon")?,
                Column::Typed("energy_source_level_2") => {
                    plant.energy_source_level_2 = value.to_string()
                }
                Column::Typed("technology") => plant.technology = value.to_string(),
                Column::Typed("federal_states") => plant.federal_states = value.to_string(),
                Column::Typed("capacity") => capacity = parse_f64(value, row, "capacity")?,
                Column::Typed("capacity_in") => {
                    plant.capacity_in = parse_f64(value, row, "capacity_in")?
                }
                Column::Typed("efficiency") => {
                    plant.efficiency = parse_f64(value, row, "efficiency")?
                }
                Column::Typed("com_year") => plant.com_year = parse_int(value, row, "com_year")?,
                Column::Typed("com_month") => {
                    plant.com_month = parse_month(value, row, "com_month")?
                }
                Column::Typed("decom_year") => {
                    plant.decom_year = parse_int(value, row, "decom_year")?
                }
                Column::Typed("decom_month") => {
                    plant.decom_month = parse_month(value, row, "decom_month")?
                }
                Column::Typed("coastdat2") => {
                    plant.coastdat2 = parse_int(value, row, "coastdat2")?
                }
                Column::Typed(_) => {}
                Column::Region => {
                    plant.region = Some(value.trim().to_string()).filter(|r| !r.is_empty())
                }
                Column::YearCapacity(year) => {
                    let v = parse_f64(value, row, "capacity_<year>")?.unwrap_or(0.0);
                    plant.yearly.entry(*year).or_insert_with(YearCapacity::default).capacity = v;
                }
                Column::YearCapacityIn(year) => {
                    let v = parse_f64(value, row, "capacity_in_<year>")?.unwrap_or(0.0);
                    plant.yearly.entry(*year).or_insert_with(YearCapacity::default).capacity_in = v;
                }
                Column::Attribute(name) => {
                    plant.attributes.insert(name.clone(), value.to_string());
                }
            }
        }

        plant.capacity = capacity.ok_or_else(|| DeflexError::InvalidRecord {
            row,
            reason: "capacity is missing".to_string(),
        })?;
        plants.push(plant);
    }

    Ok(PowerPlantTable::new(plants))
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a register to a CSV file, replacing any existing file
pub fn write_register(table: &PowerPlantTable, path: &Path, region_column: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_register_to(table, io::BufWriter::new(file), region_column)?;
    tracing::debug!("Wrote {} plants to {}", table.len(), path.display());
    Ok(())
}

/// Write a register as CSV to any writer
pub fn write_register_to(
    table: &PowerPlantTable,
    writer: impl Write,
    region_column: &str,
) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let years = table.year_columns();
    let attributes = table.attribute_columns();
    let with_region = table.iter().any(|p| p.region.is_some());

    let mut header: Vec<String> = TYPED_COLUMNS.iter().map(|c| c.to_string()).collect();
    if with_region {
        header.push(region_column.to_string());
    }
    for year in &years {
        header.push(format!("capacity_{}", year));
        header.push(format!("capacity_in_{}", year));
    }
    header.extend(attributes.iter().cloned());
    wtr.write_record(&header).map_err(csv_error)?;

    for plant in table.iter() {
        let mut record = vec![
            plant.id.clone(),
            opt(plant.lat),
            opt(plant.lon),
            plant.energy_source_level_2.clone(),
            plant.technology.clone(),
            plant.federal_states.clone(),
            plant.capacity.to_string(),
            opt(plant.capacity_in),
            opt(plant.efficiency),
            opt(plant.com_year),
            opt(plant.com_month),
            opt(plant.decom_year),
            opt(plant.decom_month),
            opt(plant.coastdat2),
        ];
        if with_region {
            record.push(plant.region.clone().unwrap_or_default());
        }
        for year in &years {
            let yc = plant.capacity_for(*year);
            record.push(yc.capacity.to_string());
            record.push(yc.capacity_in.to_string());
        }
        for name in &attributes {
            record.push(plant.attributes.get(name).cloned().unwrap_or_default());
        }
        wtr.write_record(&record).map_err(csv_error)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Column name → value view of a plant, used for display
pub fn plant_row(plant: &PowerPlant, region_column: &str) -> BTreeMap<String, String> {
    let mut row = plant.attributes.clone();
    row.insert("id".to_string(), plant.id.clone());
    row.insert("energy_source_level_2".to_string(), plant.energy_source_level_2.clone());
    row.insert("technology".to_string(), plant.technology.clone());
    row.insert("capacity".to_string(), plant.capacity.to_string());
    row.insert(region_column.to_string(), plant.region.clone().unwrap_or_default());
    row
}
