pub mod feedin;
pub mod geometry;
pub mod mastr;
pub mod powerplant;
pub mod region;
pub mod transmission;

pub use feedin::{FeedinCategory, FeedinColumn, FeedinTable};
pub use geometry::Geometry;
pub use mastr::{MastrPlant, TurbineDefaults};
pub use powerplant::{
    technology, PowerPlant, PowerPlantTable, YearCapacity, CAPACITY_COLUMNS,
};
pub use region::{ModelRegion, RegionSet};
pub use transmission::{LineId, TransmissionLine};
