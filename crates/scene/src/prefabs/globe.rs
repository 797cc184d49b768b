use foundation::math::Vec3;

use crate::World;
use crate::components::{BoundingSphere, Drawable3D, GeometryId, MaterialId, Transform};
use crate::entity::EntityId;

/// Spawns the globe body under `parent`. Its bounds double as the picking
/// occluder for anything placed on the surface.
pub fn spawn_globe_surface(
    world: &mut World,
    parent: EntityId,
    sphere: GeometryId,
    material: MaterialId,
    radius: f64,
) -> EntityId {
    let entity = world.spawn_child(parent);
    world.set_transform(entity, Transform::identity().with_scale(radius));
    world.set_drawable_3d(entity, Drawable3D::mesh(sphere, material));
    world.set_bounds(entity, BoundingSphere::new(Vec3::ZERO, radius));
    entity
}

/// Spawns one line entity per graticule geometry into a fresh group.
pub fn spawn_graticule(
    world: &mut World,
    parent: EntityId,
    lines: &[GeometryId],
    material: MaterialId,
) -> EntityId {
    let group = world.spawn_child(parent);
    for &geometry in lines {
        let line = world.spawn_child(group);
        world.set_transform(line, Transform::identity());
        world.set_drawable_3d(line, Drawable3D::line(geometry, material));
    }
    group
}
