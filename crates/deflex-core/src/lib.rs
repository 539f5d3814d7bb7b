//! deflex Core - Domain models, configuration and ports
//!
//! This crate contains the power-plant, region, transmission and feed-in models
//! shared by all deflex crates, together with the port traits that the external
//! data services have to implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use config::DeflexConfig;
pub use error::{DeflexError, Result};
