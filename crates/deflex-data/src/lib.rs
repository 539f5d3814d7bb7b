//! deflex Data - Power-plant registers, feed-in series and transmission lines
//!
//! Batch preparation steps that turn the national registers and grid data
//! into region-tagged inputs for the deflex model. Every step reads an
//! explicit [`DeflexConfig`](deflex_core::DeflexConfig) and talks to the
//! external services through the ports of `deflex-core`.

pub mod apportion;
pub mod cache;
pub mod feedin;
pub mod mastr;
pub mod offshore;
pub mod powerplants;
pub mod register;
pub mod transmission;

pub use apportion::{get_pp_by_year, ServicePeriod};
pub use cache::{CacheKey, FileCache};
pub use feedin::FeedinAggregator;
pub use mastr::{MastrCategory, MastrPreparer};
pub use offshore::remove_onshore_technology_from_offshore_regions;
pub use powerplants::PowerPlantLoader;
pub use transmission::get_electrical_transmission_deflex;
