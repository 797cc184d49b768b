use foundation::math::project;
use gpu::resources::{Geometry, Material, Rgb};
use runtime::animation::Pulse;
use scene::components::{BoundingSphere, Drawable3D, Tag, Transform};
use scene::World;
use scene::entity::EntityId;
use tracing::debug;

use crate::data::Beacon;
use crate::layer::{Layer, LayerContext, LayerId, OwnedResources, reset_group};
use crate::symbology::{
    ACCENT, PIN_DEFAULT_INTENSITY, PIN_HEAD_RADIUS, PINS_STYLE, TOWER_RADIUS, glow_base_opacity,
    glow_scale, pulse_opacity, tower_height, tower_opacity,
};

/// Per-glow animation state.
#[derive(Debug, Copy, Clone, PartialEq)]
struct GlowPulse {
    sprite: EntityId,
    base_opacity: f64,
    pulse: Pulse,
}

/// One marker per beacon: head, glow sprite and a radial tower.
///
/// Every generated object is tagged with the beacon id and carries pick
/// bounds, so a ray hit on any part resolves back to the beacon.
#[derive(Debug)]
pub struct PinsLayer {
    group: EntityId,
    owned: OwnedResources,
    pulses: Vec<GlowPulse>,
    rebuilds: u64,
}

impl PinsLayer {
    pub fn new(world: &mut World, parent: EntityId) -> Self {
        Self {
            group: world.spawn_child(parent),
            owned: OwnedResources::default(),
            pulses: Vec::new(),
            rebuilds: 0,
        }
    }

    pub fn pin_count(&self) -> usize {
        self.pulses.len()
    }

    /// Advances every glow's phase and writes the pulsed opacity.
    pub fn animate(&mut self, world: &mut World, dt_s: f64) {
        for glow in &mut self.pulses {
            glow.pulse.advance(dt_s);
        }
        let pulses = &self.pulses;
        world.for_each_sprite_mut(self.group, |entity, _, opacity| {
            if let Some(glow) = pulses.iter().find(|g| g.sprite == entity) {
                *opacity = pulse_opacity(glow.base_opacity, glow.pulse.wave());
            }
        });
    }

    fn spawn_pin(&mut self, ctx: &mut LayerContext<'_>, beacon: &Beacon) {
        let intensity = beacon.intensity_or(PIN_DEFAULT_INTENSITY);
        let anchor = project(beacon.position, PINS_STYLE.anchor_radius(ctx.globe_radius));
        let axis = anchor.normalize();
        let tag = Tag::new(beacon.id.clone());

        let root = ctx.world.spawn_child(self.group);
        ctx.world.set_transform(root, Transform::radial(anchor));
        ctx.world.set_tag(root, tag.clone());

        let head = ctx.world.spawn_child(root);
        let material = if beacon.is_hot(PIN_DEFAULT_INTENSITY) {
            ctx.assets.pin_hot_material
        } else {
            ctx.assets.pin_material
        };
        ctx.world.set_transform(head, Transform::radial(anchor).with_scale(PIN_HEAD_RADIUS));
        ctx.world.set_drawable_3d(head, Drawable3D::mesh(ctx.assets.pin_head, material));
        ctx.world.set_bounds(head, BoundingSphere::new(anchor, PIN_HEAD_RADIUS));
        ctx.world.set_tag(head, tag.clone());

        let sprite = ctx.world.spawn_child(root);
        let scale = glow_scale(intensity);
        let base_opacity = glow_base_opacity(beacon.sponsored);
        let glow_material = if beacon.sponsored {
            ctx.assets.glow_sponsored
        } else {
            ctx.assets.glow_accent
        };
        ctx.world.set_transform(sprite, Transform::radial(anchor).with_scale(scale));
        ctx.world.set_drawable_3d(sprite, Drawable3D::sprite(glow_material, base_opacity));
        // Only the bright core of the glow is clickable.
        ctx.world.set_bounds(sprite, BoundingSphere::new(anchor, scale * 0.25));
        ctx.world.set_tag(sprite, tag.clone());

        let tower = ctx.world.spawn_child(root);
        let height = tower_height(intensity);
        let tower_color = if beacon.sponsored { Rgb::WHITE } else { ACCENT };
        let geometry = self.owned.geometry(
            ctx.resources,
            Geometry::Cylinder {
                radius: TOWER_RADIUS,
                height,
                radial_segments: 10,
            },
        );
        let mut tower_material = Material::basic(tower_color, tower_opacity(beacon.sponsored));
        tower_material.depth_write = false;
        let tower_material = self.owned.material(ctx.resources, tower_material);
        let center = anchor + axis * (height * 0.5);
        ctx.world.set_transform(tower, Transform::radial(anchor));
        ctx.world.set_drawable_3d(tower, Drawable3D::mesh(geometry, tower_material));
        ctx.world.set_bounds(tower, BoundingSphere::new(center, height * 0.5));
        ctx.world.set_tag(tower, tag);

        self.pulses.push(GlowPulse {
            sprite,
            base_opacity,
            pulse: Pulse::new(1.8 + intensity),
        });
    }
}

impl Layer for PinsLayer {
    type Input = [Beacon];

    fn id(&self) -> LayerId {
        LayerId::Pins
    }

    fn group(&self) -> EntityId {
        self.group
    }

    fn rebuild(&mut self, ctx: &mut LayerContext<'_>, beacons: &[Beacon]) {
        self.clear(ctx);
        for beacon in beacons {
            self.spawn_pin(ctx, beacon);
        }
        self.rebuilds += 1;
        debug!(layer = "pins", count = beacons.len(), "layer rebuilt");
    }

    fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn clear(&mut self, ctx: &mut LayerContext<'_>) {
        reset_group(ctx, self.group, &mut self.owned);
        self.pulses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::PinsLayer;
    use crate::data::{Beacon, BeaconKind};
    use crate::layer::Layer;
    use crate::layer::testing::Fixture;
    use scene::components::{Drawable3D, Visibility};

    fn beacons() -> Vec<Beacon> {
        vec![
            Beacon::new("a", 51.5, -0.12).with_intensity(1.0),
            Beacon::new("b", 52.5, 13.4).with_intensity(0.5),
            Beacon::new("c", 40.7, -74.0).with_kind(BeaconKind::Event).with_sponsored(true),
        ]
    }

    #[test]
    fn builds_tagged_objects_per_beacon() {
        let mut fx = Fixture::new();
        let mut pins = PinsLayer::new(&mut fx.world, fx.root);
        pins.rebuild(&mut fx.ctx(), &beacons());

        assert_eq!(pins.pin_count(), 3);
        assert_eq!(pins.rebuild_count(), 1);
        // head + sprite + tower per beacon
        assert_eq!(fx.world.drawables_3d().len(), 9);
        for (entity, _, _) in fx.world.drawables_3d() {
            assert!(fx.world.tag(entity).is_some());
            assert!(fx.world.bounds(entity).is_some());
        }
    }

    #[test]
    fn hot_beacons_use_emissive_material() {
        let mut fx = Fixture::new();
        let mut pins = PinsLayer::new(&mut fx.world, fx.root);
        pins.rebuild(&mut fx.ctx(), &beacons());

        let heads: Vec<_> = fx
            .world
            .drawables_3d()
            .into_iter()
            .filter(|(_, _, d)| matches!(d, Drawable3D::Mesh { geometry, .. } if *geometry == fx.assets.pin_head))
            .map(|(e, _, d)| (fx.world.tag(e).map(|t| t.0.clone()), d.material()))
            .collect();
        assert_eq!(heads.len(), 3);
        for (tag, material) in heads {
            let expect_hot = matches!(tag.as_deref(), Some("a") | Some("c"));
            let hot = material == fx.assets.pin_hot_material;
            assert_eq!(hot, expect_hot, "{tag:?}");
        }
    }

    #[test]
    fn rebuild_releases_owned_resources() {
        let mut fx = Fixture::new();
        let shared = fx.resources.live_count();
        let mut pins = PinsLayer::new(&mut fx.world, fx.root);
        pins.rebuild(&mut fx.ctx(), &beacons());
        assert_eq!(fx.resources.live_count(), shared + 6);

        pins.rebuild(&mut fx.ctx(), &beacons()[..1]);
        assert_eq!(fx.resources.live_count(), shared + 2);
        assert_eq!(fx.world.drawables_3d().len(), 3);

        pins.rebuild(&mut fx.ctx(), &[]);
        assert_eq!(fx.resources.live_count(), shared);
        assert_eq!(pins.rebuild_count(), 3);
    }

    #[test]
    fn pulse_keeps_opacity_in_range() {
        let mut fx = Fixture::new();
        let mut pins = PinsLayer::new(&mut fx.world, fx.root);
        pins.rebuild(&mut fx.ctx(), &beacons());
        for _ in 0..200 {
            pins.animate(&mut fx.world, 1.0 / 60.0);
        }
        for (_, _, d) in fx.world.drawables_3d() {
            if let Drawable3D::Sprite { opacity, .. } = d {
                assert!((0.05..=0.95).contains(&opacity));
            }
        }
    }

    #[test]
    fn toggling_hides_without_rebuild() {
        let mut fx = Fixture::new();
        let mut pins = PinsLayer::new(&mut fx.world, fx.root);
        pins.rebuild(&mut fx.ctx(), &beacons());
        let before = fx.world.drawables_3d();

        pins.set_visible(&mut fx.world, false);
        assert!(fx.world.drawables_3d().is_empty());
        assert_eq!(fx.world.visibility(pins.group()), Visibility::hidden());
        pins.set_visible(&mut fx.world, true);

        assert_eq!(fx.world.drawables_3d(), before);
        assert_eq!(pins.rebuild_count(), 1);
    }
}
