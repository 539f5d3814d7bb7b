//! Transmission capacities between model regions

use deflex_core::config::{AmbiguousCapacity, DeflexConfig};
use deflex_core::error::{DeflexError, Result};
use deflex_core::models::{LineId, TransmissionLine};
use deflex_core::ports::RegionProvider;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// One directed connection of the renpass grid table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridRecord {
    pub plus_region_id: i64,
    pub minus_region_id: i64,
    pub scenario_name: String,
    pub circuits: f64,
    pub voltage: f64,
    pub distance: f64,
}

/// Thermal line capacity in MW (renpass, F. Wiese p. 49)
pub fn renpass_capacity(circuits: f64, voltage: f64, current_max: f64, security_factor: f64) -> f64 {
    circuits * current_max * voltage * security_factor * 3f64.sqrt() / 1000.0
}

pub fn read_renpass_grid(path: &Path) -> Result<Vec<GridRecord>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DeflexError::FileNotFound {
            path: path.to_path_buf(),
            hint: "The renpass grid table is required for this map.".to_string(),
        },
        _ => DeflexError::Io(e),
    })?;
    read_renpass_grid_from(file)
}

pub fn read_renpass_grid_from(reader: impl Read) -> Result<Vec<GridRecord>> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<std::result::Result<Vec<GridRecord>, _>>()
        .map_err(|e| DeflexError::Csv(e.to_string()))
}

/// Summed capacity and distance of the grid rows from `plus` to `minus`
///
/// `(0, 0)` if the grid has no such connection.
pub fn get_grid_capacity(
    grid: &[GridRecord],
    plus: i64,
    minus: i64,
    config: &DeflexConfig,
) -> (f64, f64) {
    let tr = &config.transmission;
    let rows: Vec<&GridRecord> = grid
        .iter()
        .filter(|r| {
            r.plus_region_id == plus
                && r.minus_region_id == minus
                && r.scenario_name == tr.scenario_name
        })
        .collect();

    match rows.first() {
        Some(first) => {
            let capacity = rows
                .iter()
                .map(|r| renpass_capacity(r.circuits, r.voltage, tr.current_max, tr.security_factor))
                .sum();
            (capacity, first.distance)
        }
        None => (0.0, 0.0),
    }
}

/// renpass id of a deflex region: "DE01" -> 11001
pub fn renpass_region_id(region: &str) -> Result<i64> {
    region
        .get(2..)
        .and_then(|n| format!("110{}", n).parse().ok())
        .ok_or_else(|| DeflexError::InvalidLineId { id: region.to_string() })
}

/// Lines with capacity and distance from the renpass grid table
///
/// A line takes the capacity of the one direction with data. Lines with
/// capacity in both directions are handled by the configured
/// [`AmbiguousCapacity`] policy.
pub fn get_electrical_transmission_renpass(
    config: &DeflexConfig,
    regions: &dyn RegionProvider,
) -> Result<Vec<TransmissionLine>> {
    let grid = read_renpass_grid(&config.renpass_grid_path())?;
    let power_lines = regions.power_lines(&config.map)?;
    let mut lines = Vec::with_capacity(power_lines.len());

    for id in power_lines {
        let a = renpass_region_id(&id.from)?;
        let b = renpass_region_id(&id.to)?;
        let (cap1, dist1) = get_grid_capacity(&grid, a, b, config);
        let (cap2, dist2) = get_grid_capacity(&grid, b, a, config);

        let (capacity, distance) = match (cap1 != 0.0, cap2 != 0.0) {
            (false, false) => (0.0, 0.0),
            (false, true) => (cap2, dist2),
            (true, false) => (cap1, dist1),
            (true, true) => match config.transmission.ambiguous_capacity {
                AmbiguousCapacity::Drop => {
                    tracing::error!(
                        "Error in {}: grid capacity in both directions ({} / {}), line dropped",
                        id,
                        cap1,
                        cap2
                    );
                    continue;
                }
                AmbiguousCapacity::Error => {
                    return Err(DeflexError::AmbiguousGridCapacity {
                        line: id.to_string(),
                        forward: cap1,
                        backward: cap2,
                    })
                }
                AmbiguousCapacity::Average => ((cap1 + cap2) / 2.0, dist1),
            },
        };

        lines.push(TransmissionLine { id, capacity, distance: Some(distance), efficiency: None });
    }

    Ok(lines)
}

/// Unconstrained lines for maps without grid data
///
/// A map without a power-line file has no lines.
pub fn get_electrical_transmission_default(
    config: &DeflexConfig,
    regions: &dyn RegionProvider,
) -> Result<Vec<TransmissionLine>> {
    let power_lines = match regions.power_lines(&config.map) {
        Ok(lines) => lines,
        Err(DeflexError::FileNotFound { path, .. }) => {
            tracing::warn!("No power lines for {}: {} not found", config.map, path.display());
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    Ok(power_lines.into_iter().map(TransmissionLine::unconstrained).collect())
}

/// Add the opposite direction of every line that lacks it
///
/// Applying this twice gives the same set of lines as applying it once.
pub fn duplicate_lines(lines: Vec<TransmissionLine>) -> Vec<TransmissionLine> {
    let mut present: BTreeSet<LineId> = lines.iter().map(|l| l.id.clone()).collect();
    let mirrored: Vec<TransmissionLine> = lines
        .iter()
        .filter_map(|line| {
            let reverse = line.mirrored();
            present.insert(reverse.id.clone()).then_some(reverse)
        })
        .collect();

    let mut all = lines;
    all.extend(mirrored);
    all
}

/// Transmission lines of the active map, renpass based where grid data exists
pub fn get_electrical_transmission_deflex(
    config: &DeflexConfig,
    regions: &dyn RegionProvider,
    duplicate: bool,
) -> Result<Vec<TransmissionLine>> {
    let lines = if config.is_renpass_map() {
        get_electrical_transmission_renpass(config, regions)?
    } else {
        get_electrical_transmission_default(config, regions)?
    };
    tracing::info!("{} transmission lines for {}", lines.len(), config.map);

    Ok(if duplicate { duplicate_lines(lines) } else { lines })
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write lines as CSV (`line,capacity,distance,efficiency`)
pub fn write_lines_csv(lines: &[TransmissionLine], writer: impl Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let err = |e: csv::Error| DeflexError::Csv(e.to_string());
    wtr.write_record(["line", "capacity", "distance", "efficiency"]).map_err(err)?;
    for line in lines {
        wtr.write_record([
            line.id.to_string(),
            line.capacity.to_string(),
            opt(line.distance),
            opt(line.efficiency),
        ])
        .map_err(err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(from: &str, to: &str, capacity: f64) -> TransmissionLine {
        TransmissionLine {
            id: LineId::new(from, to),
            capacity,
            distance: Some(10.0),
            efficiency: None,
        }
    }

    #[test]
    fn test_renpass_formula() {
        let expected = 2.0 * 2720.0 * 380.0 * 0.7 * 3f64.sqrt() / 1000.0;
        assert_eq!(renpass_capacity(2.0, 380.0, 2720.0, 0.7), expected);
    }

    #[test]
    fn test_renpass_region_id() {
        assert_eq!(renpass_region_id("DE01").unwrap(), 11001);
        assert_eq!(renpass_region_id("DE21").unwrap(), 11021);
        assert!(renpass_region_id("D").is_err());
    }

    #[test]
    fn test_grid_capacity_by_direction_and_scenario() {
        let config = DeflexConfig::defaults().unwrap();
        let data = "\
plus_region_id,minus_region_id,scenario_name,circuits,voltage,distance,comment
11001,11002,status_quo_2012_distance,1,380,120.5,a
11001,11002,status_quo_2012_distance,2,220,99.0,b
11001,11002,other,5,380,1.0,c
";
        let grid = read_renpass_grid_from(data.as_bytes()).unwrap();
        let (cap, dist) = get_grid_capacity(&grid, 11001, 11002, &config);
        let expected = renpass_capacity(1.0, 380.0, 2720.0, 0.7)
            + renpass_capacity(2.0, 220.0, 2720.0, 0.7);
        assert!((cap - expected).abs() < 1e-9);
        assert_eq!(dist, 120.5);
        assert_eq!(get_grid_capacity(&grid, 11002, 11001, &config), (0.0, 0.0));
    }

    #[test]
    fn test_duplicate_single_direction() {
        let lines = duplicate_lines(vec![line("A", "B", 5.0)]);
        let ids: BTreeSet<String> = lines.iter().map(|l| l.id.to_string()).collect();
        assert_eq!(ids, BTreeSet::from(["A-B".to_string(), "B-A".to_string()]));
        assert_eq!(lines[0].capacity, lines[1].capacity);
        assert_eq!(lines[0].distance, lines[1].distance);
    }

    #[test]
    fn test_duplicate_twice_does_not_grow() {
        let once = duplicate_lines(vec![line("A", "B", 5.0), line("B", "C", 1.0)]);
        let twice = duplicate_lines(once.clone());
        assert_eq!(once.len(), 4);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_write_lines_csv() {
        let mut buf = Vec::new();
        write_lines_csv(&[TransmissionLine::unconstrained(LineId::new("DE01", "DE02"))], &mut buf)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "line,capacity,distance,efficiency\nDE01-DE02,inf,,1\n");
    }

    proptest! {
        #[test]
        fn prop_duplicate_is_idempotent(pairs in prop::collection::vec((0u8..6, 0u8..6), 0..20)) {
            let lines: Vec<TransmissionLine> = pairs
                .iter()
                .filter(|(a, b)| a != b)
                .map(|(a, b)| line(&format!("R{}", a), &format!("R{}", b), 1.0))
                .collect();
            let once = duplicate_lines(lines);
            let twice = duplicate_lines(once.clone());
            let ids: BTreeSet<LineId> = once.iter().map(|l| l.id.clone()).collect();
            prop_assert_eq!(twice.len(), once.len());
            for l in &once {
                prop_assert!(ids.contains(&l.id.reversed()));
            }
        }
    }
}
