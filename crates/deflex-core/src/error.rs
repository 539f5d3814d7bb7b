//! Error types for deflex

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeflexError {
    // Configuration errors
    #[error("Coast regions not defined for {map} model")]
    CoastRegionsUndefined { map: String },

    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Input data errors
    #[error("File not found: {path}. {hint}")]
    FileNotFound { path: PathBuf, hint: String },

    #[error("Category {category} not existent. Choose from: {}", options.join(", "))]
    UnsupportedCategory {
        category: String,
        options: Vec<String>,
    },

    #[error("{category} MaStR data not added, yet")]
    CategoryNotAdded { category: String },

    #[error("Invalid record in row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Invalid power line identifier '{id}': expected '<region>-<region>'")]
    InvalidLineId { id: String },

    // Transmission errors
    #[error("Ambiguous grid capacity for line {line}: {forward} MW forward, {backward} MW backward")]
    AmbiguousGridCapacity {
        line: String,
        forward: f64,
        backward: f64,
    },

    // Geometry errors
    #[error("Geometry error: {0}")]
    Geometry(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DeflexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_category_lists_options() {
        let err = DeflexError::UnsupportedCategory {
            category: "Biomass".to_string(),
            options: vec!["Wind".to_string()],
        };
        assert_eq!(err.to_string(), "Category Biomass not existent. Choose from: Wind");
    }

    #[test]
    fn test_coast_regions_message() {
        let err = DeflexError::CoastRegionsUndefined { map: "de05".to_string() };
        assert_eq!(err.to_string(), "Coast regions not defined for de05 model");
    }
}
