use image::{Rgba, RgbaImage};

/// Sampler address mode along one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

/// CPU-side RGBA8 texture plus its sampler wrap modes.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub image: RgbaImage,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
        }
    }

    /// Equirectangular surface map: wraps around longitude, clamps at the poles.
    pub fn equirectangular(image: RgbaImage) -> Self {
        Self {
            image,
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::ClampToEdge,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    pub fn byte_len(&self) -> usize {
        self.image.as_raw().len()
    }
}

/// Source-over compositing of a straight-alpha colour onto an opaque pixel.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, rgb: [f64; 3], alpha: f64) {
    let a = alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let d = f64::from(dst.0[c]);
        dst.0[c] = (rgb[c] * a + d * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
    }
}
