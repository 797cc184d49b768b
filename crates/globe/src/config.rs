use layers::trails::TrailsConfig;
use serde::{Deserialize, Serialize};

use crate::error::GlobeError;

/// Tunables for one globe instance. Every section falls back to its
/// defaults when absent from a config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub globe: GlobeSettings,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub lod: LodConfig,
    pub trails: TrailsSettings,
    pub textures: TextureConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub radius: f64,
    pub sphere_segments: u32,
    /// Latitude bands; `rings - 1` ring lines are drawn between ±80°.
    pub graticule_rings: u32,
    pub graticule_meridians: u32,
    pub graticule_points: u32,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            radius: 1.35,
            sphere_segments: 64,
            graticule_rings: 18,
            graticule_meridians: 24,
            graticule_points: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub initial_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Distance change per wheel tick.
    pub wheel_step: f64,
    pub max_pixel_ratio: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            near: 0.1,
            far: 200.0,
            initial_distance: 4.2,
            min_distance: 2.1,
            max_distance: 5.6,
            wheel_step: 0.18,
            max_pixel_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Radians of rotation per dragged pixel.
    pub rotate_speed: f64,
    /// Fraction of the last drag step kept as velocity on release.
    pub inertia_gain: f64,
    /// Per-frame velocity multiplier while idle.
    pub damping: f64,
    pub pitch_limit: f64,
    /// Clicks are swallowed while either velocity component exceeds this.
    pub click_velocity_epsilon: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 0.004,
            inertia_gain: 0.35,
            damping: 0.93,
            pitch_limit: 0.9,
            click_velocity_epsilon: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Beyond this distance only tier-1 labels are shown.
    pub far_band: f64,
    /// Beyond this distance tiers 1 and 2 are shown; closer shows all.
    pub medium_band: f64,
    /// Minimum cosine between a label direction and the camera direction.
    pub front_threshold: f64,
    pub label_scale_numerator: f64,
    pub label_scale_min: f64,
    pub label_scale_max: f64,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            far_band: 3.5,
            medium_band: 2.5,
            front_threshold: 0.25,
            label_scale_numerator: 4.8,
            label_scale_min: 0.78,
            label_scale_max: 1.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailsSettings {
    pub max_points: usize,
    pub arc_segments: usize,
}

impl Default for TrailsSettings {
    fn default() -> Self {
        let d = TrailsConfig::default();
        Self {
            max_points: d.max_points,
            arc_segments: d.arc_segments,
        }
    }
}

impl TrailsSettings {
    pub fn to_layer_config(&self) -> TrailsConfig {
        TrailsConfig {
            max_points: self.max_points,
            arc_segments: self.arc_segments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Width of the procedural surface; height is half of it.
    pub surface_size: u32,
    pub glow_size: u32,
    /// Fixed seed for reproducible procedural surfaces.
    pub seed: Option<u64>,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            surface_size: 1024,
            glow_size: 128,
            seed: None,
        }
    }
}

impl GlobeConfig {
    pub fn validate(&self) -> Result<(), GlobeError> {
        let invalid = |msg: &str| Err(GlobeError::InvalidConfig(msg.to_string()));

        if !(self.globe.radius.is_finite() && self.globe.radius > 0.0) {
            return invalid("globe.radius must be positive");
        }
        if self.globe.sphere_segments < 3 || self.globe.graticule_points < 2 {
            return invalid("globe segment counts are too small");
        }

        let cam = &self.camera;
        if !(cam.fov_y_deg > 0.0 && cam.fov_y_deg < 180.0) {
            return invalid("camera.fov_y_deg must be in (0, 180)");
        }
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return invalid("camera near/far planes are inverted");
        }
        if !(cam.min_distance > self.globe.radius) {
            return invalid("camera.min_distance must keep the camera outside the globe");
        }
        if cam.min_distance > cam.max_distance {
            return invalid("camera.min_distance exceeds camera.max_distance");
        }
        if !(cam.wheel_step > 0.0) || !(cam.max_pixel_ratio > 0.0) {
            return invalid("camera.wheel_step and camera.max_pixel_ratio must be positive");
        }

        let ix = &self.interaction;
        if !(ix.damping > 0.0 && ix.damping < 1.0) {
            return invalid("interaction.damping must be in (0, 1)");
        }
        if !(ix.pitch_limit > 0.0 && ix.pitch_limit < std::f64::consts::FRAC_PI_2) {
            return invalid("interaction.pitch_limit must be in (0, pi/2)");
        }
        if !(ix.rotate_speed > 0.0) || ix.click_velocity_epsilon < 0.0 {
            return invalid("interaction speeds must be positive");
        }

        let lod = &self.lod;
        if lod.medium_band > lod.far_band {
            return invalid("lod.medium_band exceeds lod.far_band");
        }
        if !(lod.front_threshold > -1.0 && lod.front_threshold < 1.0) {
            return invalid("lod.front_threshold must be in (-1, 1)");
        }
        if !(lod.label_scale_min > 0.0 && lod.label_scale_min <= lod.label_scale_max) {
            return invalid("lod label scale range is empty");
        }

        if self.trails.arc_segments == 0 {
            return invalid("trails.arc_segments must be positive");
        }
        if self.textures.surface_size < 2 || self.textures.glow_size < 2 {
            return invalid("texture sizes must be at least 2");
        }
        Ok(())
    }

    pub fn fov_y_rad(&self) -> f64 {
        self.camera.fov_y_deg.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::GlobeConfig;
    use crate::error::GlobeError;

    #[test]
    fn defaults_are_valid() {
        assert!(GlobeConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_distance_range() {
        let mut cfg = GlobeConfig::default();
        cfg.camera.min_distance = 6.0;
        assert!(matches!(cfg.validate(), Err(GlobeError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_damping_outside_unit_interval() {
        let mut cfg = GlobeConfig::default();
        cfg.interaction.damping = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_lod_bands() {
        let mut cfg = GlobeConfig::default();
        cfg.lod.medium_band = 4.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: GlobeConfig =
            serde_json::from_str(r#"{ "camera": { "min_distance": 2.5 }, "lod": { "front_threshold": 0.1 } }"#)
                .unwrap();
        assert_eq!(cfg.camera.min_distance, 2.5);
        assert_eq!(cfg.camera.max_distance, 5.6);
        assert_eq!(cfg.lod.front_threshold, 0.1);
        assert_eq!(cfg.interaction.damping, 0.93);
        assert_eq!(cfg.globe.radius, 1.35);
    }
}
