use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command results either as styled text or as one JSON document
///
/// In JSON mode stdout carries only the final result, so the status lines,
/// tables and sections are skipped.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json { OutputFormat::Json } else { OutputFormat::Human };
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn human(&self, line: impl FnOnce() -> String) {
        if !self.is_json() {
            println!("{}", line());
        }
    }

    pub fn success(&self, message: impl Display) {
        self.human(|| format!("{} {}", style("✓").green().bold(), message));
    }

    pub fn info(&self, message: impl Display) {
        self.human(|| format!("{} {}", style("ℹ").blue().bold(), message));
    }

    /// Warnings go to stderr in both modes
    pub fn warning(&self, message: impl Display) {
        if self.is_json() {
            eprintln!("{}", serde_json::json!({ "status": "warning", "message": message.to_string() }));
        } else {
            eprintln!("{} {}", style("⚠").yellow().bold(), message);
        }
    }

    pub fn section(&self, title: impl Display) {
        self.human(|| format!("\n{}", style(title).bold().underlined()));
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        self.human(|| format!("{}: {}", style(key).bold(), value));
    }

    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        self.human(|| {
            if rows.is_empty() {
                return style("(no rows)").dim().to_string();
            }
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            table.to_string()
        });
    }

    /// Print the command result; JSON output wraps it as `{"status": "success", "data": ...}`
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let text = if self.is_json() {
            serde_json::to_string_pretty(&serde_json::json!({ "status": "success", "data": data }))?
        } else {
            serde_json::to_string_pretty(&data)?
        };
        println!("{}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        assert!(OutputWriter::new(true).is_json());
        assert!(!OutputWriter::new(false).is_json());
    }
}
