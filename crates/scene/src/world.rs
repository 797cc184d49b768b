use crate::components::{BoundingSphere, Drawable3D, Tag, Transform, Visibility};
use crate::entity::EntityId;
use foundation::handles::HandleAllocator;

/// Scene graph store.
///
/// Components live in dense `Vec<Option<_>>` columns indexed by
/// `EntityId::index()`. Handles are generational, so a despawned id never
/// aliases whatever reuses its slot.
///
/// Hierarchy is a parent pointer per entity. Groups are plain entities with
/// children; hiding a group hides its whole subtree without touching the
/// children's own flags.
#[derive(Debug, Default)]
pub struct World {
    alloc: HandleAllocator,
    ids: Vec<Option<EntityId>>,
    parents: Vec<Option<EntityId>>,
    transforms: Vec<Option<Transform>>,
    visibility: Vec<Option<Visibility>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    bounds: Vec<Option<BoundingSphere>>,
    tags: Vec<Option<Tag>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.alloc.allocate());
        let idx = id.index() as usize;
        self.ensure_capacity(idx);
        self.ids[idx] = Some(id);
        id
    }

    /// Spawns an entity parented to `parent`.
    pub fn spawn_child(&mut self, parent: EntityId) -> EntityId {
        let id = self.spawn();
        self.parents[id.index() as usize] = Some(parent);
        id
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.alloc.is_live(entity.0)
    }

    pub fn len(&self) -> usize {
        self.alloc.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the entity and everything below it. Returns how many entities
    /// were removed (0 for a stale id).
    pub fn despawn_recursive(&mut self, entity: EntityId) -> usize {
        if !self.contains(entity) {
            return 0;
        }
        let mut removed = 0;
        for child in self.children(entity) {
            removed += self.despawn_recursive(child);
        }
        let idx = entity.index() as usize;
        self.ids[idx] = None;
        self.parents[idx] = None;
        self.transforms[idx] = None;
        self.visibility[idx] = None;
        self.drawables_3d[idx] = None;
        self.bounds[idx] = None;
        self.tags[idx] = None;
        self.alloc.release(entity.0);
        removed + 1
    }

    /// Despawns every child of `parent`, keeping `parent` itself.
    pub fn clear_children(&mut self, parent: EntityId) -> usize {
        self.children(parent)
            .into_iter()
            .map(|child| self.despawn_recursive(child))
            .sum()
    }

    /// Direct children in ascending index order.
    pub fn children(&self, parent: EntityId) -> Vec<EntityId> {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(parent))
            .filter_map(|(idx, _)| self.ids[idx])
            .collect()
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.live_slot(entity).and_then(|idx| self.parents[idx])
    }

    pub fn is_descendant_of(&self, entity: EntityId, ancestor: EntityId) -> bool {
        let mut cur = self.parent(entity);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if let Some(idx) = self.live_slot(entity) {
            self.transforms[idx] = Some(transform);
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.live_slot(entity).and_then(|idx| self.transforms[idx])
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        if let Some(idx) = self.live_slot(entity) {
            self.visibility[idx] = Some(visibility);
        }
    }

    pub fn visibility(&self, entity: EntityId) -> Visibility {
        self.live_slot(entity)
            .and_then(|idx| self.visibility[idx])
            .unwrap_or_default()
    }

    /// Visible only if the entity and all of its ancestors are.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        if !self.contains(entity) {
            return false;
        }
        let mut cur = Some(entity);
        while let Some(e) = cur {
            if !self.visibility(e).visible {
                return false;
            }
            cur = self.parent(e);
        }
        true
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) {
        if let Some(idx) = self.live_slot(entity) {
            self.drawables_3d[idx] = Some(drawable);
        }
    }

    pub fn drawable_3d(&self, entity: EntityId) -> Option<Drawable3D> {
        self.live_slot(entity).and_then(|idx| self.drawables_3d[idx])
    }

    pub fn set_bounds(&mut self, entity: EntityId, bounds: BoundingSphere) {
        if let Some(idx) = self.live_slot(entity) {
            self.bounds[idx] = Some(bounds);
        }
    }

    pub fn bounds(&self, entity: EntityId) -> Option<BoundingSphere> {
        self.live_slot(entity).and_then(|idx| self.bounds[idx])
    }

    pub fn set_tag(&mut self, entity: EntityId, tag: Tag) {
        if let Some(idx) = self.live_slot(entity) {
            self.tags[idx] = Some(tag);
        }
    }

    pub fn tag(&self, entity: EntityId) -> Option<&Tag> {
        self.live_slot(entity).and_then(|idx| self.tags[idx].as_ref())
    }

    /// Effectively visible drawables, ascending by index.
    pub fn drawables_3d(&self) -> Vec<(EntityId, Transform, Drawable3D)> {
        self.drawables_3d
            .iter()
            .enumerate()
            .filter_map(|(idx, drawable)| {
                let drawable = (*drawable)?;
                let id = self.ids[idx]?;
                let transform = self.transforms[idx]?;
                self.is_visible(id).then_some((id, transform, drawable))
            })
            .collect()
    }

    /// Entities carrying pick bounds, ascending by index.
    pub fn bounded_entities(&self) -> Vec<(EntityId, BoundingSphere)> {
        self.bounds
            .iter()
            .enumerate()
            .filter_map(|(idx, b)| Some((self.ids[idx]?, (*b)?)))
            .collect()
    }

    /// Mutably visits every sprite drawable under `group`.
    pub fn for_each_sprite_mut(
        &mut self,
        group: EntityId,
        mut f: impl FnMut(EntityId, Option<&Tag>, &mut f64),
    ) {
        for idx in 0..self.drawables_3d.len() {
            let Some(id) = self.ids[idx] else { continue };
            if !self.is_descendant_of(id, group) {
                continue;
            }
            if let Some(Drawable3D::Sprite { opacity, .. }) = self.drawables_3d[idx].as_mut() {
                f(id, self.tags[idx].as_ref(), opacity);
            }
        }
    }

    fn live_slot(&self, entity: EntityId) -> Option<usize> {
        self.contains(entity).then_some(entity.index() as usize)
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.ids.len() <= idx {
            let new_len = idx + 1;
            self.ids.resize(new_len, None);
            self.parents.resize(new_len, None);
            self.transforms.resize(new_len, None);
            self.visibility.resize(new_len, None);
            self.drawables_3d.resize(new_len, None);
            self.bounds.resize(new_len, None);
            self.tags.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{Drawable3D, GeometryId, MaterialId, Tag, Transform, Visibility};
    use foundation::handles::Handle;
    use foundation::math::Vec3;

    fn mesh() -> Drawable3D {
        Drawable3D::mesh(GeometryId(Handle::new(0, 0)), MaterialId(Handle::new(0, 0)))
    }

    #[test]
    fn spawn_and_collect_drawables() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_transform(entity, Transform::identity());
        world.set_drawable_3d(entity, mesh());

        let drawables = world.drawables_3d();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, entity);
    }

    #[test]
    fn hidden_group_hides_subtree_without_touching_children() {
        let mut world = World::new();
        let group = world.spawn();
        let child = world.spawn_child(group);
        world.set_transform(child, Transform::translate(Vec3::UNIT_Y));
        world.set_drawable_3d(child, mesh());

        world.set_visibility(group, Visibility::hidden());
        assert!(world.drawables_3d().is_empty());
        assert!(world.visibility(child).visible);

        world.set_visibility(group, Visibility::visible());
        assert_eq!(world.drawables_3d().len(), 1);
    }

    #[test]
    fn despawn_recursive_invalidates_ids() {
        let mut world = World::new();
        let root = world.spawn();
        let group = world.spawn_child(root);
        let a = world.spawn_child(group);
        let b = world.spawn_child(group);
        world.set_tag(a, Tag::new("a"));

        assert_eq!(world.clear_children(group), 2);
        assert!(!world.contains(a) && !world.contains(b));
        assert!(world.contains(group));
        assert_eq!(world.tag(a), None);

        let c = world.spawn();
        assert_eq!(c.index(), b.index());
        assert_ne!(c, b);
        assert_eq!(world.despawn_recursive(a), 0);
        assert_eq!(world.len(), 3);
    }

    #[test]
    fn descendants_are_resolved_through_groups() {
        let mut world = World::new();
        let root = world.spawn();
        let group = world.spawn_child(root);
        let leaf = world.spawn_child(group);
        let other = world.spawn();
        assert!(world.is_descendant_of(leaf, root));
        assert!(!world.is_descendant_of(other, root));
        assert!(!world.is_descendant_of(root, root));
    }
}
