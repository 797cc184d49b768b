use gpu::resources::ResourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobeError {
    #[error("invalid globe configuration: {0}")]
    InvalidConfig(String),
    #[error("globe engine has been destroyed")]
    Destroyed,
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Why an imagery load did not produce a texture. Never fatal: the
/// procedural surface stays bound.
#[derive(Debug, Error)]
pub enum TextureLoadError {
    #[error("imagery read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("imagery decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported imagery: {0}")]
    Unsupported(String),
    #[error("external imagery is not allowed")]
    Consent,
}
