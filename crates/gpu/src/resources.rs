//! Render resources and their ownership.
//!
//! Every geometry, material and texture lives in a [`ResourceRegistry`].
//! Resources are registered as either `Shared` (owned by the scene manager,
//! borrowed by layers, released only by [`ResourceRegistry::dispose_all`]) or
//! `Owned` (created by a layer for one generated object and released by that
//! layer on rebuild). Each resource is released at most once.

use foundation::handles::{Handle, HandleAllocator};
use foundation::math::Vec3;
pub use scene::components::{GeometryId, MaterialId};
use thiserror::Error;

use crate::textures::Texture;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub Handle);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Geometry(GeometryId),
    Material(MaterialId),
    Texture(TextureId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("unknown resource {0:?}")]
    Unknown(ResourceKey),
    #[error("resource {0:?} was already disposed")]
    AlreadyDisposed(ResourceKey),
    #[error("resource {0:?} is shared and only released at teardown")]
    SharedResource(ResourceKey),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    Shared,
    Owned,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Unit UV sphere.
    Sphere {
        width_segments: u32,
        height_segments: u32,
    },
    /// Cylinder standing on its local origin, extending along +axis.
    Cylinder {
        radius: f64,
        height: f64,
        radial_segments: u32,
    },
    Polyline { points: Vec<Vec3>, closed: bool },
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Sphere {
                width_segments,
                height_segments,
            } => ((*width_segments + 1) * (*height_segments + 1)) as usize,
            Self::Cylinder {
                radial_segments, ..
            } => 2 * (*radial_segments as usize + 1),
            Self::Polyline { points, .. } => points.len(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Self = Rgb(255, 255, 255);
    pub const BLACK: Self = Rgb(0, 0, 0);

    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Blending {
    Normal,
    Additive,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shading {
    /// Physically based, lit.
    Standard,
    /// Unlit camera-facing quad.
    Sprite,
    /// Unlit line.
    Line,
    /// Unlit mesh.
    Basic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Rgb,
    pub emissive: Rgb,
    pub emissive_intensity: f64,
    pub roughness: f64,
    pub metalness: f64,
    pub opacity: f64,
    pub transparent: bool,
    pub blending: Blending,
    pub depth_write: bool,
    pub map: Option<TextureId>,
}

impl Material {
    pub fn standard(color: Rgb) -> Self {
        Self {
            shading: Shading::Standard,
            color,
            emissive: Rgb::BLACK,
            emissive_intensity: 0.0,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            blending: Blending::Normal,
            depth_write: true,
            map: None,
        }
    }

    pub fn basic(color: Rgb, opacity: f64) -> Self {
        Self {
            shading: Shading::Basic,
            ..Self::standard(color).with_opacity(opacity)
        }
    }

    pub fn line(color: Rgb, opacity: f64) -> Self {
        Self {
            shading: Shading::Line,
            ..Self::standard(color).with_opacity(opacity)
        }
    }

    /// Additive, depth-write-off glow quad.
    pub fn glow(map: TextureId, color: Rgb, opacity: f64) -> Self {
        Self {
            shading: Shading::Sprite,
            map: Some(map),
            blending: Blending::Additive,
            depth_write: false,
            ..Self::standard(color).with_opacity(opacity)
        }
    }

    pub fn with_surface(mut self, roughness: f64, metalness: f64) -> Self {
        self.roughness = roughness;
        self.metalness = metalness;
        self
    }

    pub fn with_emissive(mut self, emissive: Rgb, intensity: f64) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = self.opacity < 1.0;
        self
    }

    pub fn with_map(mut self, map: TextureId) -> Self {
        self.map = Some(map);
        self
    }
}

#[derive(Debug)]
struct Entry<T> {
    handle: Handle,
    value: T,
    ownership: Ownership,
}

#[derive(Debug)]
struct Pool<T> {
    alloc: HandleAllocator,
    slots: Vec<Option<Entry<T>>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            alloc: HandleAllocator::new(),
            slots: Vec::new(),
        }
    }
}

enum Removal {
    Removed,
    Stale,
    Unknown,
    Shared,
}

impl<T> Pool<T> {
    fn insert(&mut self, value: T, ownership: Ownership) -> Handle {
        let handle = self.alloc.allocate();
        let i = handle.index() as usize;
        if self.slots.len() <= i {
            self.slots.resize_with(i + 1, || None);
        }
        self.slots[i] = Some(Entry {
            handle,
            value,
            ownership,
        });
        handle
    }

    fn get(&self, h: Handle) -> Option<&Entry<T>> {
        self.slots
            .get(h.index() as usize)?
            .as_ref()
            .filter(|e| e.handle == h)
    }

    fn get_mut(&mut self, h: Handle) -> Option<&mut Entry<T>> {
        self.slots
            .get_mut(h.index() as usize)?
            .as_mut()
            .filter(|e| e.handle == h)
    }

    fn remove(&mut self, h: Handle, allow_shared: bool) -> Removal {
        let Some(entry) = self.get(h) else {
            return if (h.index() as usize) < self.alloc.capacity() {
                Removal::Stale
            } else {
                Removal::Unknown
            };
        };
        if !allow_shared && entry.ownership == Ownership::Shared {
            return Removal::Shared;
        }
        self.slots[h.index() as usize] = None;
        self.alloc.release(h);
        Removal::Removed
    }

    fn live_handles(&self) -> Vec<Handle> {
        self.slots.iter().flatten().map(|e| e.handle).collect()
    }

    fn len(&self) -> usize {
        self.alloc.live_count()
    }
}

fn removal_result(removal: Removal, key: ResourceKey) -> Result<(), ResourceError> {
    match removal {
        Removal::Removed => Ok(()),
        Removal::Stale => Err(ResourceError::AlreadyDisposed(key)),
        Removal::Unknown => Err(ResourceError::Unknown(key)),
        Removal::Shared => Err(ResourceError::SharedResource(key)),
    }
}

/// Owner of all render resources for one scene.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    geometries: Pool<Geometry>,
    materials: Pool<Material>,
    textures: Pool<Texture>,
    disposed: Vec<ResourceKey>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry, ownership: Ownership) -> GeometryId {
        GeometryId(self.geometries.insert(geometry, ownership))
    }

    pub fn add_material(&mut self, material: Material, ownership: Ownership) -> MaterialId {
        MaterialId(self.materials.insert(material, ownership))
    }

    pub fn add_texture(&mut self, texture: Texture, ownership: Ownership) -> TextureId {
        TextureId(self.textures.insert(texture, ownership))
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0).map(|e| &e.value)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0).map(|e| &e.value)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0).map(|e| &mut e.value)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0).map(|e| &e.value)
    }

    pub fn ownership(&self, key: ResourceKey) -> Option<Ownership> {
        match key {
            ResourceKey::Geometry(id) => self.geometries.get(id.0).map(|e| e.ownership),
            ResourceKey::Material(id) => self.materials.get(id.0).map(|e| e.ownership),
            ResourceKey::Texture(id) => self.textures.get(id.0).map(|e| e.ownership),
        }
    }

    /// Releases an owned resource. Shared resources are refused.
    pub fn dispose(&mut self, key: ResourceKey) -> Result<(), ResourceError> {
        let removal = match key {
            ResourceKey::Geometry(id) => self.geometries.remove(id.0, false),
            ResourceKey::Material(id) => self.materials.remove(id.0, false),
            ResourceKey::Texture(id) => self.textures.remove(id.0, false),
        };
        removal_result(removal, key)?;
        self.disposed.push(key);
        Ok(())
    }

    /// Releases a shared texture before teardown, e.g. when imagery is swapped.
    pub fn dispose_shared_texture(&mut self, id: TextureId) -> Result<(), ResourceError> {
        let key = ResourceKey::Texture(id);
        removal_result(self.textures.remove(id.0, true), key)?;
        self.disposed.push(key);
        Ok(())
    }

    /// Releases every remaining resource, shared ones included. Returns how
    /// many were released; a second call releases nothing.
    pub fn dispose_all(&mut self) -> usize {
        let mut keys: Vec<ResourceKey> = Vec::new();
        keys.extend(self.geometries.live_handles().into_iter().map(|h| ResourceKey::Geometry(GeometryId(h))));
        keys.extend(self.materials.live_handles().into_iter().map(|h| ResourceKey::Material(MaterialId(h))));
        keys.extend(self.textures.live_handles().into_iter().map(|h| ResourceKey::Texture(TextureId(h))));

        for key in &keys {
            match *key {
                ResourceKey::Geometry(id) => self.geometries.remove(id.0, true),
                ResourceKey::Material(id) => self.materials.remove(id.0, true),
                ResourceKey::Texture(id) => self.textures.remove(id.0, true),
            };
        }
        let n = keys.len();
        self.disposed.extend(keys);
        n
    }

    pub fn live_count(&self) -> usize {
        self.geometries.len() + self.materials.len() + self.textures.len()
    }

    /// How many times `key` has been released (0 or 1 unless something is wrong).
    pub fn disposal_count(&self, key: ResourceKey) -> usize {
        self.disposed.iter().filter(|k| **k == key).count()
    }

    pub fn disposed_total(&self) -> usize {
        self.disposed.len()
    }
}
