pub mod procedural;
pub mod renderer;
pub mod resources;
pub mod textures;

pub use procedural::*;
pub use renderer::*;
pub use resources::*;
pub use textures::*;
