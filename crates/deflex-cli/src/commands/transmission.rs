//! Transmission command implementation

use crate::adapters::GeoJsonRegions;
use crate::cli::TransmissionArgs;
use crate::output::OutputWriter;
use crate::output_types::{LineRow, TransmissionOutput};
use anyhow::{Context, Result};
use deflex_core::DeflexConfig;
use deflex_data::get_electrical_transmission_deflex;
use deflex_data::transmission::write_lines_csv;
use std::fs::File;
use std::io::BufWriter;

pub fn execute(args: TransmissionArgs, config: &DeflexConfig, output: &OutputWriter) -> Result<()> {
    let regions = GeoJsonRegions::new(config);
    let lines = get_electrical_transmission_deflex(config, &regions, args.duplicate)?;

    let written_to = match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_lines_csv(&lines, BufWriter::new(file))?;
            Some(path.display().to_string())
        }
        None => None,
    };

    let rows: Vec<LineRow> = lines
        .iter()
        .map(|l| LineRow {
            line: l.id.to_string(),
            capacity: l.capacity.is_finite().then_some(l.capacity),
            distance: l.distance,
            efficiency: l.efficiency,
        })
        .collect();

    if output.is_json() {
        output.result(TransmissionOutput {
            map: config.map.clone(),
            renpass: config.is_renpass_map(),
            duplicate: args.duplicate,
            lines: rows,
            written_to,
        })?;
    } else {
        output.section(format!("Transmission lines ({})", config.map));
        if rows.is_empty() {
            output.info("No power lines defined for this map");
        } else {
            output.table(rows);
        }
        if let Some(path) = written_to {
            output.success(format!("Wrote lines to {}", path));
        }
    }
    Ok(())
}
