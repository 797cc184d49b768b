//! Colours, sizes and lifts shared by the layers.

use gpu::resources::Rgb;

/// Brand accent used for glows, heat and trails.
pub const ACCENT: Rgb = Rgb::from_hex(0xff1744);
pub const PIN_EMISSIVE: Rgb = Rgb::from_hex(0x111111);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub color: Rgb,
    /// Radial lift as a fraction of the globe radius.
    pub lift: f64,
}

impl LayerStyle {
    pub const fn new(color: Rgb, lift: f64) -> Self {
        Self { color, lift }
    }

    /// Radius at which this layer's objects are anchored.
    pub fn anchor_radius(&self, globe_radius: f64) -> f64 {
        globe_radius * (1.0 + self.lift)
    }
}

pub const PINS_STYLE: LayerStyle = LayerStyle::new(ACCENT, 0.01);
pub const HEAT_STYLE: LayerStyle = LayerStyle::new(ACCENT, 0.002);
pub const TRAILS_STYLE: LayerStyle = LayerStyle::new(ACCENT, 0.01);
pub const CITIES_STYLE: LayerStyle = LayerStyle::new(Rgb::WHITE, 0.02);

/// Default intensity of a pin with no source value.
pub const PIN_DEFAULT_INTENSITY: f64 = 0.6;
/// Default intensity of a heat smudge with no source value.
pub const HEAT_DEFAULT_INTENSITY: f64 = 0.5;

pub const PIN_HEAD_RADIUS: f64 = 0.015;
pub const TOWER_RADIUS: f64 = 0.004;

pub fn glow_scale(intensity: f64) -> f64 {
    0.22 + intensity * 0.25
}

pub fn glow_base_opacity(sponsored: bool) -> f64 {
    if sponsored { 0.38 } else { 0.55 }
}

pub fn tower_height(intensity: f64) -> f64 {
    0.09 + intensity * 0.22
}

pub fn tower_opacity(sponsored: bool) -> f64 {
    if sponsored { 0.22 } else { 0.18 }
}

pub fn heat_opacity(intensity: f64) -> f64 {
    0.08 + intensity * 0.22
}

pub fn heat_scale(intensity: f64) -> f64 {
    0.35 + intensity * 0.65
}

/// Pulsed glow opacity for a wave value in `[0, 1]`.
pub fn pulse_opacity(base: f64, wave: f64) -> f64 {
    (base * (0.78 + 0.22 * wave)).clamp(0.05, 0.95)
}

#[cfg(test)]
mod tests {
    use super::{PINS_STYLE, glow_scale, pulse_opacity, tower_height};

    #[test]
    fn sizes_grow_with_intensity() {
        assert!(glow_scale(1.0) > glow_scale(0.05));
        assert!(tower_height(1.0) > tower_height(0.5));
    }

    #[test]
    fn pulse_stays_in_range() {
        assert!((pulse_opacity(0.55, 1.0) - 0.55).abs() < 1e-12);
        assert!((pulse_opacity(0.55, 0.0) - 0.429).abs() < 1e-12);
        assert_eq!(pulse_opacity(10.0, 1.0), 0.95);
        assert_eq!(pulse_opacity(0.0, 0.5), 0.05);
    }

    #[test]
    fn anchor_radius_applies_lift() {
        assert!((PINS_STYLE.anchor_radius(1.35) - 1.3635).abs() < 1e-12);
    }
}
