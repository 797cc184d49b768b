use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::components::BoundingSphere;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    /// Only entities below this group are candidates.
    pub root: Option<EntityId>,
    /// Opaque body that hides anything behind its front surface.
    pub occluder: Option<BoundingSphere>,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            root: None,
            occluder: None,
        }
    }
}

/// Deterministic ray picking against entity bounding spheres.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - If multiple entities are hit at the same distance, the lower `EntityId::index()` wins.
///
/// Hidden entities (including those under a hidden group) are never hit.
/// The ray must be expressed in the same frame as the bounds.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = normalize(ray.dir)?;
    let ray = Ray::new(ray.origin, dir);

    let horizon = opts
        .occluder
        .and_then(|o| o.ray_hit_t(ray))
        .unwrap_or(f64::INFINITY);

    let mut best: Option<(f64, EntityId)> = None;
    for (entity, bounds) in world.bounded_entities() {
        if let Some(root) = opts.root
            && !world.is_descendant_of(entity, root)
        {
            continue;
        }
        if !world.is_visible(entity) {
            continue;
        }
        let Some(t) = bounds.ray_hit_t(ray) else {
            continue;
        };
        if t > opts.max_distance || t > horizon {
            continue;
        }

        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() { Some((t, entity)) } else { Some((bt, be)) }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: ray.origin + dir * t,
    })
}

/// Screen picking wrapper.
///
/// The caller supplies the screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    world: &World,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(world, ray, opts)
}

fn normalize(v: Vec3) -> Option<Vec3> {
    let l2 = v.dot(v);
    if l2 <= 0.0 || !l2.is_finite() {
        return None;
    }
    Some(v * (1.0 / l2.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick_ray, pick_screen};
    use crate::World;
    use crate::components::{BoundingSphere, Visibility};
    use foundation::math::Vec3;

    fn ray_down_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, -2.0))
    }

    #[test]
    fn ray_picks_nearest_hit() {
        let mut world = World::new();
        let far = world.spawn();
        world.set_bounds(far, BoundingSphere::new(Vec3::new(0.0, 0.0, 1.0), 0.5));
        let near = world.spawn();
        world.set_bounds(near, BoundingSphere::new(Vec3::new(0.0, 0.0, 4.0), 0.5));

        let hit = pick_ray(&world, ray_down_z(), PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 5.5).abs() < 1e-12);
        assert!(hit.point.distance(Vec3::new(0.0, 0.0, 4.5)) < 1e-12);
    }

    #[test]
    fn tie_breaks_by_entity_index() {
        let mut world = World::new();
        let first = world.spawn();
        let second = world.spawn();
        for e in [second, first] {
            world.set_bounds(e, BoundingSphere::new(Vec3::ZERO, 1.0));
        }
        let hit = pick_ray(&world, ray_down_z(), PickOptions::default()).expect("hit");
        assert_eq!(hit.entity, first);
    }

    #[test]
    fn root_and_visibility_restrict_candidates() {
        let mut world = World::new();
        let pins = world.spawn();
        let decor = world.spawn();
        let pin = world.spawn_child(pins);
        let glow = world.spawn_child(decor);
        world.set_bounds(pin, BoundingSphere::new(Vec3::ZERO, 0.1));
        world.set_bounds(glow, BoundingSphere::new(Vec3::new(0.0, 0.0, 2.0), 0.1));

        let opts = PickOptions {
            root: Some(pins),
            ..PickOptions::default()
        };
        assert_eq!(pick_ray(&world, ray_down_z(), opts).map(|h| h.entity), Some(pin));

        world.set_visibility(pins, Visibility::hidden());
        assert_eq!(pick_ray(&world, ray_down_z(), opts), None);
    }

    #[test]
    fn occluder_hides_far_side() {
        let mut world = World::new();
        let back = world.spawn();
        world.set_bounds(back, BoundingSphere::new(Vec3::new(0.0, 0.0, -1.0), 0.05));
        let opts = PickOptions {
            occluder: Some(BoundingSphere::new(Vec3::ZERO, 1.0)),
            ..PickOptions::default()
        };
        assert_eq!(pick_ray(&world, ray_down_z(), opts), None);
        assert!(pick_ray(&world, ray_down_z(), PickOptions::default()).is_some());
    }

    #[test]
    fn screen_pick_without_ray_misses() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_bounds(e, BoundingSphere::new(Vec3::ZERO, 1.0));
        let hit = pick_screen(&world, 5.0, 5.0, |_, _| None, PickOptions::default());
        assert_eq!(hit, None);
        let hit = pick_screen(&world, 5.0, 5.0, |_, _| Some(ray_down_z()), PickOptions::default());
        assert_eq!(hit.map(|h| h.entity), Some(e));
    }
}
