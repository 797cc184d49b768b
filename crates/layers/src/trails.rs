use foundation::math::great_circle_arc;
use gpu::resources::Geometry;
use scene::World;
use scene::components::{Drawable3D, Transform};
use scene::entity::EntityId;
use tracing::debug;

use crate::data::Beacon;
use crate::layer::{Layer, LayerContext, LayerId, OwnedResources, reset_group};
use crate::symbology::TRAILS_STYLE;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TrailsConfig {
    /// How many of the most recent beacons are chained.
    pub max_points: usize,
    pub arc_segments: usize,
}

impl Default for TrailsConfig {
    fn default() -> Self {
        Self {
            max_points: 12,
            arc_segments: 72,
        }
    }
}

/// Consecutive pairs of the most recent beacons, oldest first.
///
/// This is a display heuristic for recent activity flow; a pair says nothing
/// about the two beacons being related.
pub fn trail_pairs(beacons: &[Beacon], max_points: usize) -> Vec<(&Beacon, &Beacon)> {
    let mut sorted: Vec<&Beacon> = beacons.iter().collect();
    sorted.sort_by_key(|b| b.recency_key());
    if sorted.len() < 2 {
        return Vec::new();
    }
    let recent = &sorted[sorted.len().saturating_sub(max_points.max(2))..];
    recent.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Great-circle arcs chaining recent beacons.
#[derive(Debug)]
pub struct TrailsLayer {
    group: EntityId,
    config: TrailsConfig,
    owned: OwnedResources,
    /// `(from, to)` beacon ids of the current arcs.
    arcs: Vec<(String, String)>,
    rebuilds: u64,
}

impl TrailsLayer {
    pub fn new(world: &mut World, parent: EntityId, config: TrailsConfig) -> Self {
        Self {
            group: world.spawn_child(parent),
            config,
            owned: OwnedResources::default(),
            arcs: Vec::new(),
            rebuilds: 0,
        }
    }

    pub fn arcs(&self) -> &[(String, String)] {
        &self.arcs
    }
}

impl Layer for TrailsLayer {
    type Input = [Beacon];

    fn id(&self) -> LayerId {
        LayerId::Trails
    }

    fn group(&self) -> EntityId {
        self.group
    }

    fn rebuild(&mut self, ctx: &mut LayerContext<'_>, beacons: &[Beacon]) {
        self.clear(ctx);
        let radius = TRAILS_STYLE.anchor_radius(ctx.globe_radius);
        for (a, b) in trail_pairs(beacons, self.config.max_points) {
            let points = great_circle_arc(a.position, b.position, radius, self.config.arc_segments);
            let geometry = self.owned.geometry(
                ctx.resources,
                Geometry::Polyline {
                    points,
                    closed: false,
                },
            );
            let line = ctx.world.spawn_child(self.group);
            ctx.world.set_transform(line, Transform::identity());
            ctx.world
                .set_drawable_3d(line, Drawable3D::line(geometry, ctx.assets.trail_material));
            self.arcs.push((a.id.clone(), b.id.clone()));
        }
        self.rebuilds += 1;
        debug!(layer = "trails", count = self.arcs.len(), "layer rebuilt");
    }

    fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn clear(&mut self, ctx: &mut LayerContext<'_>) {
        reset_group(ctx, self.group, &mut self.owned);
        self.arcs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{TrailsConfig, TrailsLayer, trail_pairs};
    use crate::data::Beacon;
    use crate::layer::Layer;
    use crate::layer::testing::Fixture;
    use foundation::math::project;
    use gpu::resources::Geometry;
    use pretty_assertions::assert_eq;

    fn ids(pairs: &[(&Beacon, &Beacon)]) -> Vec<(String, String)> {
        pairs.iter().map(|(a, b)| (a.id.clone(), b.id.clone())).collect()
    }

    #[test]
    fn fewer_than_two_beacons_make_no_trails() {
        assert!(trail_pairs(&[], 12).is_empty());
        assert!(trail_pairs(&[Beacon::new("x", 0.0, 0.0)], 12).is_empty());
    }

    #[test]
    fn pairs_follow_timestamps_with_missing_as_oldest() {
        let beacons = vec![
            Beacon::new("late", 0.0, 0.0).with_timestamp(300),
            Beacon::new("none", 0.0, 0.0),
            Beacon::new("early", 0.0, 0.0).with_timestamp(100),
        ];
        let pairs = trail_pairs(&beacons, 12);
        assert_eq!(
            ids(&pairs),
            vec![
                ("none".to_string(), "early".to_string()),
                ("early".to_string(), "late".to_string()),
            ]
        );
    }

    #[test]
    fn only_most_recent_points_are_chained() {
        let beacons: Vec<Beacon> = (0..20)
            .map(|i| Beacon::new(format!("b{i}"), 0.0, i as f64).with_timestamp(i))
            .collect();
        let pairs = trail_pairs(&beacons, 12);
        assert_eq!(pairs.len(), 11);
        assert_eq!(pairs[0].0.id, "b8");
        assert_eq!(pairs[10].1.id, "b19");
    }

    #[test]
    fn scenario_single_arc_from_oldest_to_newest() {
        let mut fx = Fixture::new();
        let mut trails = TrailsLayer::new(&mut fx.world, fx.root, TrailsConfig::default());
        let a = Beacon::new("a", 51.5, -0.12).with_intensity(1.0).with_timestamp(1000);
        let b = Beacon::new("b", 52.5, 13.4).with_intensity(0.5).with_timestamp(2000);
        trails.rebuild(&mut fx.ctx(), &[b.clone(), a.clone()]);

        assert_eq!(trails.arcs(), &[("a".to_string(), "b".to_string())]);
        let drawables = fx.world.drawables_3d();
        assert_eq!(drawables.len(), 1);
        let geometry = drawables[0].2.geometry().unwrap();
        let Some(Geometry::Polyline { points, closed }) = fx.resources.geometry(geometry) else {
            panic!("polyline expected");
        };
        assert!(!closed);
        assert_eq!(points.len(), 73);
        let r = 1.35 * 1.01;
        assert!(points[0].distance(project(a.position, r)) < 1e-9);
        assert!(points[72].distance(project(b.position, r)) < 1e-9);
    }
}
