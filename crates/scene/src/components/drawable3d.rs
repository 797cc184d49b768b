use foundation::handles::Handle;

/// Geometry buffer owned by the render resource registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub Handle);

/// Material owned by the render resource registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub Handle);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Drawable3D {
    /// Lit triangle mesh.
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
    /// Camera-facing quad; `opacity` multiplies the material's opacity.
    Sprite { material: MaterialId, opacity: f64 },
    /// Polyline (open or closed, per geometry).
    Line {
        geometry: GeometryId,
        material: MaterialId,
    },
}

impl Drawable3D {
    pub fn mesh(geometry: GeometryId, material: MaterialId) -> Self {
        Self::Mesh { geometry, material }
    }

    pub fn sprite(material: MaterialId, opacity: f64) -> Self {
        Self::Sprite { material, opacity }
    }

    pub fn line(geometry: GeometryId, material: MaterialId) -> Self {
        Self::Line { geometry, material }
    }

    pub fn material(&self) -> MaterialId {
        match *self {
            Self::Mesh { material, .. } | Self::Sprite { material, .. } | Self::Line { material, .. } => {
                material
            }
        }
    }

    pub fn geometry(&self) -> Option<GeometryId> {
        match *self {
            Self::Mesh { geometry, .. } | Self::Line { geometry, .. } => Some(geometry),
            Self::Sprite { .. } => None,
        }
    }
}
