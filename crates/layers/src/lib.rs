pub mod cities;
pub mod data;
pub mod heat;
pub mod labels;
pub mod layer;
pub mod pins;
pub mod registry;
pub mod symbology;
pub mod trails;

pub use data::*;
pub use layer::*;
pub use registry::*;
