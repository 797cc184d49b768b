use foundation::math::Vec3;

/// Placement of an object in its group's frame.
///
/// `axis` is the object's local up direction (radial for anything standing on
/// the globe); `scale` is uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub axis: Vec3,
    pub scale: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            axis: Vec3::UNIT_Y,
            scale: 1.0,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Placed at `position` with its up axis along `position` itself.
    pub fn radial(position: Vec3) -> Self {
        let axis = position.normalize();
        Self {
            position,
            axis: if axis == Vec3::ZERO { Vec3::UNIT_Y } else { axis },
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}
