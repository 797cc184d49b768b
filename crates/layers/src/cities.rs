use foundation::math::{Vec3, project};
use scene::World;
use scene::components::{Tag, Transform, Visibility};
use scene::entity::EntityId;
use tracing::debug;

use crate::data::City;
use crate::labels::{BADGE_ACTIVE, BADGE_SPONSORED, LabelStyle, estimate_label_size};
use crate::layer::{Layer, LayerContext, LayerId};
use crate::symbology::CITIES_STYLE;

/// A screen-anchored label tied to one city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityLabel {
    pub entity: EntityId,
    pub city: City,
    /// Anchor in the globe frame (before rotation).
    pub anchor: Vec3,
    pub badges: Vec<&'static str>,
    /// Unscaled pill size in CSS pixels.
    pub size_px: [f64; 2],
}

/// One label per city, slightly above the surface. Which labels are shown
/// is decided every frame by the LOD pass; the layer only builds them.
#[derive(Debug)]
pub struct CityLabelsLayer {
    group: EntityId,
    style: LabelStyle,
    labels: Vec<CityLabel>,
    rebuilds: u64,
}

impl CityLabelsLayer {
    pub fn new(world: &mut World, parent: EntityId, style: LabelStyle) -> Self {
        Self {
            group: world.spawn_child(parent),
            style,
            labels: Vec::new(),
            rebuilds: 0,
        }
    }

    pub fn labels(&self) -> &[CityLabel] {
        &self.labels
    }

    pub fn label(&self, key: usize) -> Option<&CityLabel> {
        self.labels.get(key)
    }
}

impl Layer for CityLabelsLayer {
    type Input = [City];

    fn id(&self) -> LayerId {
        LayerId::Cities
    }

    fn group(&self) -> EntityId {
        self.group
    }

    fn rebuild(&mut self, ctx: &mut LayerContext<'_>, cities: &[City]) {
        self.clear(ctx);
        let radius = CITIES_STYLE.anchor_radius(ctx.globe_radius);
        for city in cities {
            let anchor = project(city.position, radius);
            let entity = ctx.world.spawn_child(self.group);
            ctx.world.set_transform(entity, Transform::radial(anchor));
            ctx.world.set_tag(entity, Tag::new(city.name.clone()));
            // Hidden until the first LOD pass decides otherwise.
            ctx.world.set_visibility(entity, Visibility::hidden());

            let mut badges = Vec::new();
            if city.active {
                badges.push(BADGE_ACTIVE);
            }
            if city.sponsored {
                badges.push(BADGE_SPONSORED);
            }
            let size_px = estimate_label_size(&city.name, &badges, &self.style);
            self.labels.push(CityLabel {
                entity,
                city: city.clone(),
                anchor,
                badges,
                size_px,
            });
        }
        self.rebuilds += 1;
        debug!(layer = "cities", count = cities.len(), "layer rebuilt");
    }

    fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn clear(&mut self, ctx: &mut LayerContext<'_>) {
        ctx.world.clear_children(self.group);
        self.labels.clear();
    }
}
