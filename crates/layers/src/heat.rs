use foundation::math::project;
use scene::World;
use scene::components::{Drawable3D, Transform};
use scene::entity::EntityId;
use tracing::debug;

use crate::data::Beacon;
use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::{HEAT_DEFAULT_INTENSITY, HEAT_STYLE, heat_opacity, heat_scale};

/// Decorative additive smudges hugging the surface. Not pickable.
#[derive(Debug)]
pub struct HeatLayer {
    group: EntityId,
    rebuilds: u64,
}

impl HeatLayer {
    pub fn new(world: &mut World, parent: EntityId) -> Self {
        Self {
            group: world.spawn_child(parent),
            rebuilds: 0,
        }
    }
}

impl Layer for HeatLayer {
    type Input = [Beacon];

    fn id(&self) -> LayerId {
        LayerId::Heat
    }

    fn group(&self) -> EntityId {
        self.group
    }

    fn rebuild(&mut self, ctx: &mut LayerContext<'_>, beacons: &[Beacon]) {
        self.clear(ctx);
        let radius = HEAT_STYLE.anchor_radius(ctx.globe_radius);
        for beacon in beacons {
            let intensity = beacon.intensity_or(HEAT_DEFAULT_INTENSITY);
            let smudge = ctx.world.spawn_child(self.group);
            ctx.world.set_transform(
                smudge,
                Transform::radial(project(beacon.position, radius)).with_scale(heat_scale(intensity)),
            );
            ctx.world.set_drawable_3d(
                smudge,
                Drawable3D::sprite(ctx.assets.heat_material, heat_opacity(intensity)),
            );
        }
        self.rebuilds += 1;
        debug!(layer = "heat", count = beacons.len(), "layer rebuilt");
    }

    fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn clear(&mut self, ctx: &mut LayerContext<'_>) {
        // Smudges only borrow the shared heat material.
        ctx.world.clear_children(self.group);
    }
}
