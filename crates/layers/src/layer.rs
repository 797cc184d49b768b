use gpu::resources::{Geometry, Material, Ownership, ResourceKey, ResourceRegistry, Rgb, TextureId};
use scene::World;
use scene::components::{GeometryId, MaterialId, Visibility};
use scene::entity::EntityId;
use tracing::debug;

use crate::symbology::{ACCENT, PIN_EMISSIVE};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    Pins,
    Heat,
    Trails,
    Cities,
}

impl LayerId {
    pub const ALL: [LayerId; 4] = [LayerId::Pins, LayerId::Heat, LayerId::Trails, LayerId::Cities];

    pub fn name(self) -> &'static str {
        match self {
            LayerId::Pins => "pins",
            LayerId::Heat => "heat",
            LayerId::Trails => "trails",
            LayerId::Cities => "cities",
        }
    }
}

/// Everything a layer touches while regenerating its objects.
pub struct LayerContext<'a> {
    pub world: &'a mut World,
    pub resources: &'a mut ResourceRegistry,
    pub assets: &'a LayerAssets,
    pub globe_radius: f64,
}

/// A self-contained group of generated objects.
///
/// `rebuild` throws away everything previously generated and regenerates from
/// the input. Visibility is a flag on the layer's group and never triggers a
/// rebuild.
pub trait Layer {
    type Input: ?Sized;

    fn id(&self) -> LayerId;

    /// Group entity every generated object is parented to.
    fn group(&self) -> EntityId;

    fn rebuild(&mut self, ctx: &mut LayerContext<'_>, input: &Self::Input);

    /// Number of completed rebuilds.
    fn rebuild_count(&self) -> u64;

    /// Releases every resource this layer owns and despawns its objects.
    fn clear(&mut self, ctx: &mut LayerContext<'_>);

    fn set_visible(&self, world: &mut World, visible: bool) {
        world.set_visibility(self.group(), Visibility::from_flag(visible));
    }

    fn is_visible(&self, world: &World) -> bool {
        world.visibility(self.group()).visible
    }
}

/// Resources created for individual generated objects.
#[derive(Debug, Default)]
pub struct OwnedResources {
    keys: Vec<ResourceKey>,
}

impl OwnedResources {
    pub fn geometry(&mut self, resources: &mut ResourceRegistry, geometry: Geometry) -> GeometryId {
        let id = resources.add_geometry(geometry, Ownership::Owned);
        self.keys.push(ResourceKey::Geometry(id));
        id
    }

    pub fn material(&mut self, resources: &mut ResourceRegistry, material: Material) -> MaterialId {
        let id = resources.add_material(material, Ownership::Owned);
        self.keys.push(ResourceKey::Material(id));
        id
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn release_all(&mut self, resources: &mut ResourceRegistry) {
        for key in self.keys.drain(..) {
            if let Err(err) = resources.dispose(key) {
                debug!(%err, "layer resource already released");
            }
        }
    }
}

/// Clears a layer's generated objects and owned resources.
pub(crate) fn reset_group(ctx: &mut LayerContext<'_>, group: EntityId, owned: &mut OwnedResources) {
    ctx.world.clear_children(group);
    owned.release_all(ctx.resources);
}

/// Resources the layers borrow from the scene manager. All are registered
/// as shared and released only at teardown.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerAssets {
    pub glow_texture: TextureId,
    pub pin_head: GeometryId,
    pub pin_material: MaterialId,
    pub pin_hot_material: MaterialId,
    pub glow_accent: MaterialId,
    pub glow_sponsored: MaterialId,
    pub heat_material: MaterialId,
    pub trail_material: MaterialId,
}

impl LayerAssets {
    pub fn create(resources: &mut ResourceRegistry, glow_texture: TextureId) -> Self {
        let shared = Ownership::Shared;
        Self {
            glow_texture,
            pin_head: resources.add_geometry(
                Geometry::Sphere {
                    width_segments: 16,
                    height_segments: 16,
                },
                shared,
            ),
            pin_material: resources.add_material(
                Material::standard(Rgb::WHITE)
                    .with_surface(0.55, 0.15)
                    .with_emissive(PIN_EMISSIVE, 0.25),
                shared,
            ),
            pin_hot_material: resources.add_material(
                Material::standard(Rgb::WHITE)
                    .with_surface(0.35, 0.15)
                    .with_emissive(ACCENT, 0.85),
                shared,
            ),
            glow_accent: resources.add_material(Material::glow(glow_texture, ACCENT, 1.0), shared),
            glow_sponsored: resources.add_material(Material::glow(glow_texture, Rgb::WHITE, 1.0), shared),
            heat_material: resources.add_material(Material::glow(glow_texture, ACCENT, 1.0), shared),
            trail_material: resources.add_material(Material::line(ACCENT, 0.18), shared),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use gpu::procedural::generate_glow_sprite;
    use gpu::resources::{Ownership, ResourceRegistry};
    use scene::World;
    use scene::entity::EntityId;

    use super::{LayerAssets, LayerContext};

    pub struct Fixture {
        pub world: World,
        pub resources: ResourceRegistry,
        pub assets: LayerAssets,
        pub root: EntityId,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut world = World::new();
            let root = world.spawn();
            let mut resources = ResourceRegistry::new();
            let glow = resources.add_texture(generate_glow_sprite(8), Ownership::Shared);
            let assets = LayerAssets::create(&mut resources, glow);
            Self {
                world,
                resources,
                assets,
                root,
            }
        }

        pub fn ctx(&mut self) -> LayerContext<'_> {
            LayerContext {
                world: &mut self.world,
                resources: &mut self.resources,
                assets: &self.assets,
                globe_radius: 1.35,
            }
        }
    }
}
