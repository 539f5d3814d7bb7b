//! deflex Geo - Region geometries and spatial joins
//!
//! This crate converts region outlines into `geo` types, indexes them in an
//! R-tree and assigns plant locations to model regions.

pub mod index;
pub mod models;
pub mod regions;
pub mod spatial;

pub use index::RegionIndex;
pub use models::to_multi_polygon;
pub use regions::{load_named_polygons, load_power_lines_geojson, load_regions_geojson};
pub use spatial::{spatial_join_with_buffer, JoinOptions, JoinResult, JoinSummary};
