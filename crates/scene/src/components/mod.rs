pub mod bounds;
pub mod drawable3d;
pub mod tag;
pub mod transform;
pub mod visibility;

pub use bounds::*;
pub use drawable3d::*;
pub use tag::*;
pub use transform::*;
pub use visibility::*;
