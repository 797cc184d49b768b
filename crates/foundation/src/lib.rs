pub mod handles;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use handles::*;
pub use math::*;
pub use time::*;
