use foundation::math::Vec3;

use crate::picking::Ray;

/// Sphere used for hit testing, in the owning group's frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius
    }

    /// Entry distance along a ray with unit `dir`; a ray starting inside hits at 0.
    pub fn ray_hit_t(&self, ray: Ray) -> Option<f64> {
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.dir);
        let c = oc.dot(oc) - self.radius * self.radius;
        if c <= 0.0 {
            return Some(0.0);
        }
        if b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        Some(-b - disc.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingSphere;
    use crate::picking::Ray;
    use foundation::math::Vec3;

    #[test]
    fn contains_point_inside() {
        let s = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert!(s.contains(Vec3::new(1.2, 0.1, 0.0)));
        assert!(!s.contains(Vec3::ZERO));
    }

    #[test]
    fn ray_hits_front_surface() {
        let s = BoundingSphere::new(Vec3::ZERO, 1.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let t = s.ray_hit_t(ray).unwrap();
        assert!((t - 4.0).abs() < 1e-12);
    }

    #[test]
    fn ray_misses_and_pointing_away() {
        let s = BoundingSphere::new(Vec3::ZERO, 1.0);
        let miss = Ray::new(Vec3::new(2.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(s.ray_hit_t(miss), None);
        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(s.ray_hit_t(away), None);
    }
}
