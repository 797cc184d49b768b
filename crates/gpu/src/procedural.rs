//! Fallback rasters used when no imagery is available.
//!
//! Both generators are pure functions of their size (plus a seed for the
//! surface variant). Callers cache the result in the resource registry.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::textures::{Texture, blend_over};

/// Reference width the blob/band dimensions are tuned for.
const REFERENCE_WIDTH: f64 = 1024.0;
const BLOB_COUNT: usize = 95;
const BAND_COUNT: usize = 14;

/// (offset, rgb, alpha) stops of a continent blob.
const BLOB_STOPS: [(f64, [f64; 3], f64); 3] = [
    (0.0, [70.0, 85.0, 70.0], 0.55),
    (0.6, [35.0, 45.0, 35.0], 0.30),
    (1.0, [0.0, 0.0, 0.0], 0.0),
];

/// (offset, alpha) stops of the white glow sprite.
const GLOW_STOPS: [(f64, f64); 4] = [(0.0, 1.0), (0.25, 0.55), (0.6, 0.15), (1.0, 0.0)];

/// 2:1 surface raster: low-frequency noise, soft landmass blobs and faint
/// cloud bands. Seeded from entropy.
pub fn generate_surface_texture(size: u32) -> Texture {
    generate_surface_texture_seeded(size, rand::random())
}

/// Same as [`generate_surface_texture`] with a fixed seed.
pub fn generate_surface_texture_seeded(size: u32, seed: u64) -> Texture {
    let width = size.max(2);
    let height = (width / 2).max(1);
    let scale = f64::from(width) / REFERENCE_WIDTH;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut img = RgbaImage::from_fn(width, height, |_, _| {
        let v = 18.0 + rng.r#gen::<f64>() * 55.0;
        Rgba([
            (v * 0.9) as u8,
            (v * 1.05) as u8,
            (v * 1.1).min(255.0) as u8,
            255,
        ])
    });

    for _ in 0..BLOB_COUNT {
        let cx = rng.r#gen::<f64>() * f64::from(width);
        let cy = rng.r#gen::<f64>() * f64::from(height);
        let r = (18.0 + rng.r#gen::<f64>() * 110.0) * scale;
        paint_blob(&mut img, cx, cy, r.max(1.0));
    }

    for i in 0..BAND_COUNT {
        let y = (i as f64 / BAND_COUNT as f64) * f64::from(height)
            + (rng.r#gen::<f64>() - 0.5) * 20.0 * scale;
        let h = (8.0 + rng.r#gen::<f64>() * 12.0) * scale;
        let y0 = y.max(0.0).floor() as u32;
        let y1 = (y + h).max(0.0).ceil().min(f64::from(height)) as u32;
        for py in y0..y1 {
            for px in 0..width {
                blend_over(img.get_pixel_mut(px, py), [255.0, 255.0, 255.0], 0.12);
            }
        }
    }

    Texture::equirectangular(img)
}

fn paint_blob(img: &mut RgbaImage, cx: f64, cy: f64, r: f64) {
    let (w, h) = (img.width(), img.height());
    let x0 = (cx - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil().max(0.0) as u32).min(w);
    let y0 = (cy - r).floor().max(0.0) as u32;
    let y1 = ((cy + r).ceil().max(0.0) as u32).min(h);
    for y in y0..y1 {
        for x in x0..x1 {
            let d = (f64::from(x) + 0.5 - cx).hypot(f64::from(y) + 0.5 - cy) / r;
            if d >= 1.0 {
                continue;
            }
            let (rgb, alpha) = sample_blob(d);
            blend_over(img.get_pixel_mut(x, y), rgb, alpha);
        }
    }
}

fn sample_blob(t: f64) -> ([f64; 3], f64) {
    for pair in BLOB_STOPS.windows(2) {
        let (t0, c0, a0) = pair[0];
        let (t1, c1, a1) = pair[1];
        if t <= t1 {
            let f = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
            let rgb = [
                c0[0] + (c1[0] - c0[0]) * f,
                c0[1] + (c1[1] - c0[1]) * f,
                c0[2] + (c1[2] - c0[2]) * f,
            ];
            return (rgb, a0 + (a1 - a0) * f);
        }
    }
    ([0.0; 3], 0.0)
}

/// Square white radial gradient, opaque centre to transparent edge.
pub fn generate_glow_sprite(size: u32) -> Texture {
    let size = size.max(2);
    let c = f64::from(size) / 2.0;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let d = (f64::from(x) + 0.5 - c).hypot(f64::from(y) + 0.5 - c) / c;
        Rgba([255, 255, 255, (glow_alpha(d) * 255.0).round() as u8])
    });
    Texture::new(img)
}

fn glow_alpha(t: f64) -> f64 {
    if t >= 1.0 {
        return 0.0;
    }
    GLOW_STOPS
        .windows(2)
        .find(|pair| t <= pair[1].0)
        .map(|pair| {
            let (t0, a0) = pair[0];
            let (t1, a1) = pair[1];
            a0 + (a1 - a0) * ((t - t0) / (t1 - t0))
        })
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::{generate_glow_sprite, generate_surface_texture, generate_surface_texture_seeded};
    use crate::textures::Wrap;

    #[test]
    fn surface_is_two_to_one_and_opaque() {
        let t = generate_surface_texture(256);
        assert_eq!((t.width(), t.height()), (256, 128));
        assert_eq!(t.wrap_s, Wrap::Repeat);
        assert!(t.image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn surface_is_reproducible_per_seed() {
        let a = generate_surface_texture_seeded(128, 7);
        let b = generate_surface_texture_seeded(128, 7);
        let c = generate_surface_texture_seeded(128, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn surface_is_dark_with_variation() {
        let t = generate_surface_texture_seeded(256, 42);
        let lum: Vec<u32> = t.image.pixels().map(|p| u32::from(p.0[1])).collect();
        let max = lum.iter().copied().max().unwrap_or(0);
        let min = lum.iter().copied().min().unwrap_or(0);
        assert!(max < 160, "too bright: {max}");
        assert!(max > min);
    }

    #[test]
    fn glow_fades_from_center_to_edge() {
        let t = generate_glow_sprite(128);
        assert_eq!((t.width(), t.height()), (128, 128));
        let center = t.pixel(64, 64).unwrap().0[3];
        let mid = t.pixel(64 + 20, 64).unwrap().0[3];
        let corner = t.pixel(0, 0).unwrap().0[3];
        assert!(center > 240);
        assert!(center > mid && mid > corner);
        assert_eq!(corner, 0);
    }
}
