use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DeflexError, Result};

/// Weather-dependent feed-in categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedinCategory {
    Wind,
    Solar,
    Hydro,
    Geothermal,
}

impl FeedinCategory {
    pub const ALL: [FeedinCategory; 4] = [
        FeedinCategory::Wind,
        FeedinCategory::Solar,
        FeedinCategory::Hydro,
        FeedinCategory::Geothermal,
    ];

    /// Look up a category by its file key; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "wind" => Some(FeedinCategory::Wind),
            "solar" => Some(FeedinCategory::Solar),
            "hydro" => Some(FeedinCategory::Hydro),
            "geothermal" => Some(FeedinCategory::Geothermal),
            _ => None,
        }
    }

    /// Lower-case key used in file names
    pub fn file_key(&self) -> &'static str {
        match self {
            FeedinCategory::Wind => "wind",
            FeedinCategory::Solar => "solar",
            FeedinCategory::Hydro => "hydro",
            FeedinCategory::Geothermal => "geothermal",
        }
    }

    /// Matching value of the `energy_source_level_2` register column
    pub fn energy_source(&self) -> &'static str {
        match self {
            FeedinCategory::Wind => "Wind",
            FeedinCategory::Solar => "Solar",
            FeedinCategory::Hydro => "Hydro",
            FeedinCategory::Geothermal => "Geothermal",
        }
    }

    /// Number of header rows in the persisted CSV
    pub fn header_levels(&self) -> usize {
        match self {
            FeedinCategory::Wind | FeedinCategory::Solar => 3,
            FeedinCategory::Hydro | FeedinCategory::Geothermal => 1,
        }
    }
}

impl fmt::Display for FeedinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_key())
    }
}

/// One series of a feed-in table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedinColumn {
    /// One label per header level, outermost first
    pub labels: Vec<String>,

    pub values: Vec<f64>,
}

/// Time-indexed feed-in series with a one- or multi-level column header
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedinTable {
    /// Names of the header levels (e.g. region, technology, set)
    pub level_names: Vec<String>,

    /// Time index labels
    pub index: Vec<String>,

    pub columns: Vec<FeedinColumn>,
}

impl FeedinTable {
    pub fn new(level_names: Vec<String>, index: Vec<String>) -> Self {
        Self { level_names, index, columns: Vec::new() }
    }

    pub fn levels(&self) -> usize {
        self.level_names.len()
    }

    /// Number of time steps
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append a series, checking label depth and series length
    pub fn push_column(&mut self, labels: Vec<String>, values: Vec<f64>) -> Result<()> {
        if labels.len() != self.levels() {
            return Err(DeflexError::InvalidRecord {
                row: self.columns.len(),
                reason: format!(
                    "column has {} header labels, table has {} levels",
                    labels.len(),
                    self.levels()
                ),
            });
        }
        if values.len() != self.index.len() {
            return Err(DeflexError::InvalidRecord {
                row: self.columns.len(),
                reason: format!(
                    "column {} has {} values, index has {}",
                    labels.join("/"),
                    values.len(),
                    self.index.len()
                ),
            });
        }
        self.columns.push(FeedinColumn { labels, values });
        Ok(())
    }

    /// Find a series by its full label path
    pub fn column<S: AsRef<str>>(&self, labels: &[S]) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| {
                c.labels.len() == labels.len()
                    && c.labels.iter().zip(labels).all(|(a, b)| a == b.as_ref())
            })
            .map(|c| c.values.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        assert_eq!(FeedinCategory::from_name("Wind"), Some(FeedinCategory::Wind));
        assert_eq!(FeedinCategory::from_name("geothermal"), Some(FeedinCategory::Geothermal));
        assert_eq!(FeedinCategory::from_name("pv"), None);
        assert_eq!(FeedinCategory::Solar.header_levels(), 3);
        assert_eq!(FeedinCategory::Hydro.header_levels(), 1);
    }

    #[test]
    fn test_push_column_checks_shape() {
        let mut table = FeedinTable::new(
            vec!["region".to_string()],
            vec!["2014-01-01 00:00".to_string(), "2014-01-01 01:00".to_string()],
        );
        assert!(table.push_column(vec!["DE01".to_string()], vec![0.1, 0.2]).is_ok());
        assert!(table.push_column(vec!["DE02".to_string()], vec![0.1]).is_err());
        assert!(table
            .push_column(vec!["DE02".to_string(), "x".to_string()], vec![0.1, 0.2])
            .is_err());
        assert_eq!(table.column(&["DE01"]), Some(&[0.1, 0.2][..]));
    }
}
