use scene::World;
use scene::entity::EntityId;

use crate::cities::CityLabelsLayer;
use crate::data::{Beacon, City, LayerToggles};
use crate::heat::HeatLayer;
use crate::labels::LabelStyle;
use crate::layer::{Layer, LayerContext, LayerId};
use crate::pins::PinsLayer;
use crate::trails::{TrailsConfig, TrailsLayer};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct RebuildCounts {
    pub pins: u64,
    pub heat: u64,
    pub trails: u64,
    pub cities: u64,
}

impl RebuildCounts {
    pub fn total(&self) -> u64 {
        self.pins + self.heat + self.trails + self.cities
    }
}

/// The four overlay layers and their toggle state.
#[derive(Debug)]
pub struct LayerRegistry {
    pub pins: PinsLayer,
    pub heat: HeatLayer,
    pub trails: TrailsLayer,
    pub cities: CityLabelsLayer,
    toggles: LayerToggles,
}

impl LayerRegistry {
    /// Spawns one group per layer under `parent`, all visible.
    pub fn new(world: &mut World, parent: EntityId, trails: TrailsConfig, label_style: LabelStyle) -> Self {
        Self {
            pins: PinsLayer::new(world, parent),
            heat: HeatLayer::new(world, parent),
            trails: TrailsLayer::new(world, parent, trails),
            cities: CityLabelsLayer::new(world, parent, label_style),
            toggles: LayerToggles {
                pins: true,
                heat: true,
                trails: true,
                cities: true,
            },
        }
    }

    /// Full regeneration of every beacon-driven layer.
    pub fn rebuild_beacons(&mut self, ctx: &mut LayerContext<'_>, beacons: &[Beacon]) {
        self.pins.rebuild(ctx, beacons);
        self.heat.rebuild(ctx, beacons);
        self.trails.rebuild(ctx, beacons);
    }

    pub fn rebuild_cities(&mut self, ctx: &mut LayerContext<'_>, cities: &[City]) {
        self.cities.rebuild(ctx, cities);
    }

    /// Flips group visibility. Generated objects are left untouched.
    pub fn apply_toggles(&mut self, world: &mut World, toggles: LayerToggles) {
        self.pins.set_visible(world, toggles.pins);
        self.heat.set_visible(world, toggles.heat);
        self.trails.set_visible(world, toggles.trails);
        self.cities.set_visible(world, toggles.cities);
        self.toggles = toggles;
    }

    pub fn toggles(&self) -> LayerToggles {
        self.toggles
    }

    pub fn is_enabled(&self, id: LayerId) -> bool {
        match id {
            LayerId::Pins => self.toggles.pins,
            LayerId::Heat => self.toggles.heat,
            LayerId::Trails => self.toggles.trails,
            LayerId::Cities => self.toggles.cities,
        }
    }

    pub fn rebuild_counts(&self) -> RebuildCounts {
        RebuildCounts {
            pins: self.pins.rebuild_count(),
            heat: self.heat.rebuild_count(),
            trails: self.trails.rebuild_count(),
            cities: self.cities.rebuild_count(),
        }
    }

    /// Per-frame layer animation.
    pub fn animate(&mut self, world: &mut World, dt_s: f64) {
        self.pins.animate(world, dt_s);
    }

    /// Despawns all generated objects and releases layer-owned resources.
    pub fn clear(&mut self, ctx: &mut LayerContext<'_>) {
        self.pins.clear(ctx);
        self.heat.clear(ctx);
        self.trails.clear(ctx);
        self.cities.clear(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::LayerRegistry;
    use crate::data::{Beacon, City, LayerToggles};
    use crate::labels::LabelStyle;
    use crate::layer::testing::Fixture;
    use crate::trails::TrailsConfig;
    use pretty_assertions::assert_eq;

    fn registry(fx: &mut Fixture) -> LayerRegistry {
        let root = fx.root;
        LayerRegistry::new(&mut fx.world, root, TrailsConfig::default(), LabelStyle::default())
    }

    #[test]
    fn toggle_round_trip_restores_objects_without_rebuild() {
        let mut fx = Fixture::new();
        let mut reg = registry(&mut fx);
        let beacons = vec![
            Beacon::new("a", 51.5, -0.12).with_timestamp(1000),
            Beacon::new("b", 52.5, 13.4).with_timestamp(2000),
        ];
        reg.rebuild_beacons(&mut fx.ctx(), &beacons);
        reg.rebuild_cities(&mut fx.ctx(), &City::defaults());
        reg.apply_toggles(&mut fx.world, LayerToggles::default());

        let counts = reg.rebuild_counts();
        let visible = fx.world.drawables_3d();

        for flip in [false, true] {
            let toggles = LayerToggles {
                pins: flip,
                ..LayerToggles::default()
            };
            reg.apply_toggles(&mut fx.world, toggles);
        }

        assert_eq!(fx.world.drawables_3d(), visible);
        assert_eq!(reg.rebuild_counts(), counts);
    }

    #[test]
    fn default_toggles_hide_heat_and_trails() {
        let mut fx = Fixture::new();
        let mut reg = registry(&mut fx);
        let beacons = vec![
            Beacon::new("a", 0.0, 0.0).with_timestamp(1),
            Beacon::new("b", 10.0, 10.0).with_timestamp(2),
        ];
        reg.rebuild_beacons(&mut fx.ctx(), &beacons);
        assert_eq!(fx.world.drawables_3d().len(), 6 + 2 + 1);

        reg.apply_toggles(&mut fx.world, LayerToggles::default());
        assert_eq!(fx.world.drawables_3d().len(), 6);
        assert_eq!(reg.rebuild_counts().total(), 3);
    }

    #[test]
    fn clear_releases_everything_layers_own() {
        let mut fx = Fixture::new();
        let shared = fx.resources.live_count();
        let mut reg = registry(&mut fx);
        let beacons = vec![
            Beacon::new("a", 0.0, 0.0).with_timestamp(1),
            Beacon::new("b", 10.0, 10.0).with_timestamp(2),
        ];
        reg.rebuild_beacons(&mut fx.ctx(), &beacons);
        assert!(fx.resources.live_count() > shared);
        reg.clear(&mut fx.ctx());
        assert_eq!(fx.resources.live_count(), shared);
        assert!(fx.world.drawables_3d().is_empty());
    }
}
