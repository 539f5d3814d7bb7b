use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DeflexError;

/// Identifier of a directed power line between two regions, printed as "A-B"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId {
    pub from: String,
    pub to: String,
}

impl LineId {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    /// The same line with swapped endpoints
    pub fn reversed(&self) -> Self {
        Self { from: self.to.clone(), to: self.from.clone() }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for LineId {
    type Err = DeflexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), None) if !from.is_empty() && !to.is_empty() => {
                Ok(LineId::new(from, to))
            }
            _ => Err(DeflexError::InvalidLineId { id: s.to_string() }),
        }
    }
}

/// Transmission capacity between two regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionLine {
    pub id: LineId,

    /// Power limit in MW, `f64::INFINITY` when unconstrained
    pub capacity: f64,

    /// Line length, `None` when unknown
    pub distance: Option<f64>,

    /// Transfer efficiency, `None` when not modelled
    pub efficiency: Option<f64>,
}

impl TransmissionLine {
    /// A line without physical data: unlimited, lossless, no distance
    pub fn unconstrained(id: LineId) -> Self {
        Self { id, capacity: f64::INFINITY, distance: None, efficiency: Some(1.0) }
    }

    /// The same line in the opposite direction
    pub fn mirrored(&self) -> Self {
        Self { id: self.id.reversed(), ..self.clone() }
    }
}
