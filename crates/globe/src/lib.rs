pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod lod;
pub mod manager;
pub mod texture_loader;

pub use config::GlobeConfig;
pub use controller::{CameraState, GlobeController};
pub use engine::*;
pub use error::{GlobeError, TextureLoadError};
pub use events::GlobeEvent;
pub use host::{HeadlessHost, HostChild, HostContainer, ListenerKind};
pub use manager::SceneManager;
pub use texture_loader::{FileTextureSource, ManualTextureSource, TextureLoader, TextureSource, decode_texture};
