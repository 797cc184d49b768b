//! Per-frame label culling: layer toggle, zoom band and front hemisphere.

use foundation::math::{Mat3, Vec3};
use gpu::renderer::{Camera3D, LabelSprite, Viewport};
use layers::cities::CityLabel;
use layers::labels::{LabelProjector, LabelRect};
use scene::World;
use scene::components::Visibility;
use scene::entity::EntityId;

use crate::config::LodConfig;

/// Highest city tier shown at `distance`.
pub fn max_tier_for_distance(distance: f64, cfg: &LodConfig) -> u8 {
    if distance > cfg.far_band {
        1
    } else if distance > cfg.medium_band {
        2
    } else {
        3
    }
}

/// Whether `world_pos` faces the camera direction closely enough. The
/// threshold is stricter than the geometric horizon so labels vanish
/// before they reach the limb.
pub fn is_front_facing(world_pos: Vec3, camera_dir: Vec3, threshold: f64) -> bool {
    world_pos.normalize().dot(camera_dir) > threshold
}

pub fn label_scale(distance: f64, cfg: &LodConfig) -> f64 {
    if distance <= 0.0 || !distance.is_finite() {
        return cfg.label_scale_max;
    }
    (cfg.label_scale_numerator / distance).clamp(cfg.label_scale_min, cfg.label_scale_max)
}

/// Maps world positions to CSS pixels through the live camera.
pub struct CameraProjector<'a> {
    pub camera: &'a Camera3D,
    pub viewport: &'a Viewport,
}

impl LabelProjector for CameraProjector<'_> {
    fn project(&self, world: Vec3) -> Option<[f64; 2]> {
        let [x, y, _] = self.camera.project_ndc(world)?;
        let (px, py) = self.viewport.ndc_to_px(x, y);
        Some([px, py])
    }
}

/// Camera-side inputs of one pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LodView {
    pub distance: f64,
    /// Unit vector from the globe centre toward the camera.
    pub camera_dir: Vec3,
    pub rotation: Mat3,
    /// Opacity of every shown label.
    pub opacity: f64,
}

/// Clickable area of one shown label.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelHit {
    /// Index into the label list the pass ran over.
    pub key: usize,
    /// Label entity; a rebuilt list never reuses it.
    pub entity: EntityId,
    pub rect: LabelRect,
}

/// Result of a pass: what the overlay draws and where labels can be clicked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelPass {
    pub sprites: Vec<LabelSprite>,
    pub hit_regions: Vec<LabelHit>,
}

impl LabelPass {
    /// Topmost label under the pointer. Later labels are drawn over earlier.
    pub fn label_at(&self, x: f64, y: f64) -> Option<LabelHit> {
        self.hit_regions
            .iter()
            .rev()
            .find(|hit| hit.rect.contains(x, y))
            .copied()
    }

    /// Topmost hit that still refers to `labels[hit.key]`.
    pub fn current_label_at<'a>(&self, labels: &'a [CityLabel], x: f64, y: f64) -> Option<&'a CityLabel> {
        let hit = self.label_at(x, y)?;
        labels.get(hit.key).filter(|label| label.entity == hit.entity)
    }
}

/// Decides which labels are shown this frame, writes that decision into the
/// label entities' visibility and produces the overlay sprites.
pub fn run_label_pass(
    world: &mut World,
    labels: &[CityLabel],
    layer_enabled: bool,
    view: &LodView,
    projector: &dyn LabelProjector,
    cfg: &LodConfig,
) -> LabelPass {
    let mut pass = LabelPass::default();
    let max_tier = max_tier_for_distance(view.distance, cfg);
    let scale = label_scale(view.distance, cfg);

    for (key, label) in labels.iter().enumerate() {
        let world_pos = view.rotation.transform(label.anchor);
        let screen = if layer_enabled
            && label.city.tier() <= max_tier
            && is_front_facing(world_pos, view.camera_dir, cfg.front_threshold)
        {
            projector.project(world_pos)
        } else {
            None
        };

        world.set_visibility(label.entity, Visibility::from_flag(screen.is_some()));
        let Some([x_px, y_px]) = screen else {
            continue;
        };

        pass.sprites.push(LabelSprite {
            key,
            text: label.city.name.clone(),
            badges: label.badges.clone(),
            x_px,
            y_px,
            scale,
            opacity: view.opacity,
        });
        pass.hit_regions.push(LabelHit {
            key,
            entity: label.entity,
            rect: LabelRect::centered([x_px, y_px], label.size_px, scale),
        });
    }
    pass
}

#[cfg(test)]
mod tests {
    use super::{
        CameraProjector, LodView, is_front_facing, label_scale, max_tier_for_distance, run_label_pass,
    };
    use crate::config::LodConfig;
    use foundation::math::{Mat3, Vec3};
    use gpu::renderer::{Camera3D, Viewport};
    use layers::cities::CityLabelsLayer;
    use layers::data::City;
    use layers::labels::LabelStyle;
    use layers::layer::{Layer, LayerAssets, LayerContext};
    use gpu::resources::{Ownership, ResourceRegistry};
    use gpu::procedural::generate_glow_sprite;
    use scene::World;

    #[test]
    fn zoom_bands() {
        let cfg = LodConfig::default();
        assert_eq!(max_tier_for_distance(5.6, &cfg), 1);
        assert_eq!(max_tier_for_distance(3.5, &cfg), 2);
        assert_eq!(max_tier_for_distance(2.6, &cfg), 2);
        assert_eq!(max_tier_for_distance(2.5, &cfg), 3);
        assert_eq!(max_tier_for_distance(2.1, &cfg), 3);
    }

    #[test]
    fn scale_is_clamped() {
        let cfg = LodConfig::default();
        assert!((label_scale(5.6, &cfg) - 4.8 / 5.6).abs() < 1e-12);
        assert_eq!(label_scale(2.1, &cfg), 1.12);
        assert_eq!(label_scale(100.0, &cfg), 0.78);
    }

    #[test]
    fn hemisphere_threshold_is_stricter_than_horizon() {
        let cam = Vec3::new(0.0, 0.0, 1.0);
        assert!(is_front_facing(Vec3::new(0.0, 0.0, 2.0), cam, 0.25));
        // 80 degrees off axis still faces the camera geometrically.
        let limb = Vec3::new(80f64.to_radians().sin(), 0.0, 80f64.to_radians().cos());
        assert!(limb.dot(cam) > 0.0);
        assert!(!is_front_facing(limb, cam, 0.25));
    }

    fn labelled_world(cities: &[City]) -> (World, CityLabelsLayer) {
        let mut world = World::new();
        let mut resources = ResourceRegistry::new();
        let glow = resources.add_texture(generate_glow_sprite(8), Ownership::Shared);
        let assets = LayerAssets::create(&mut resources, glow);
        let root = world.spawn();
        let mut layer = CityLabelsLayer::new(&mut world, root, LabelStyle::default());
        let mut ctx = LayerContext {
            world: &mut world,
            resources: &mut resources,
            assets: &assets,
            globe_radius: 1.35,
        };
        layer.rebuild(&mut ctx, cities);
        (world, layer)
    }

    fn view(distance: f64) -> LodView {
        LodView {
            distance,
            camera_dir: Vec3::new(0.0, 0.0, 1.0),
            rotation: Mat3::IDENTITY,
            opacity: 1.0,
        }
    }

    #[test]
    fn pass_sets_entity_visibility_and_sprites() {
        // lng -90 faces +Z; lng 90 is on the far side.
        let cities = vec![
            City::new("FRONT", 0.0, -90.0, 1),
            City::new("BACK", 0.0, 90.0, 1),
            City::new("SMALL", 10.0, -90.0, 3),
        ];
        let (mut world, layer) = labelled_world(&cities);
        let mut camera = Camera3D::look_at(Vec3::new(0.0, 0.0, 4.2), Vec3::ZERO, 45f64.to_radians(), 0.1, 200.0);
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        camera.aspect = viewport.aspect();
        let projector = CameraProjector {
            camera: &camera,
            viewport: &viewport,
        };
        let cfg = LodConfig::default();

        let pass = run_label_pass(&mut world, layer.labels(), true, &view(4.2), &projector, &cfg);
        assert_eq!(pass.sprites.len(), 1);
        assert_eq!(pass.sprites[0].text, "FRONT");
        assert!((pass.sprites[0].x_px - 400.0).abs() < 1e-6);
        assert!((pass.sprites[0].y_px - 300.0).abs() < 1e-6);
        assert!(world.is_visible(layer.labels()[0].entity));
        assert!(!world.is_visible(layer.labels()[1].entity));
        assert_eq!(pass.label_at(400.0, 300.0).map(|h| h.key), Some(0));
        assert_eq!(pass.label_at(10.0, 10.0), None);
        let hit = pass.current_label_at(layer.labels(), 400.0, 300.0);
        assert_eq!(hit.map(|l| l.city.name.as_str()), Some("FRONT"));

        let off = run_label_pass(&mut world, layer.labels(), false, &view(4.2), &projector, &cfg);
        assert!(off.sprites.is_empty());
        assert!(!world.is_visible(layer.labels()[0].entity));
    }
}
