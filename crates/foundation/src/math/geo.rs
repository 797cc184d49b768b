//! Geographic coordinates on a render sphere.
//!
//! One convention is used everywhere a lat/lng becomes a world position:
//! `phi = (90 - lat)` and `theta = (lng + 180)` in radians, with
//! `x = -r sin(phi) cos(theta)`, `y = r cos(phi)`, `z = r sin(phi) sin(theta)`.
//! (0, 0) lands on `+X`, the north pole on `+Y`, and longitude -90 faces `+Z`.

use super::Vec3;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns a point with latitude clamped to `[-90, 90]` and longitude
    /// wrapped into `[-180, 180]`, or `None` when either value is not finite.
    pub fn sanitized(self) -> Option<Self> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return None;
        }
        let latitude = self.latitude.clamp(-90.0, 90.0);
        let longitude = if (-180.0..=180.0).contains(&self.longitude) {
            self.longitude
        } else {
            (self.longitude + 180.0).rem_euclid(360.0) - 180.0
        };
        Some(Self::new(latitude, longitude))
    }
}

/// Projects a geographic point onto a sphere of `radius` centred at the origin.
pub fn project(point: GeoPoint, radius: f64) -> Vec3 {
    let phi = (90.0 - point.latitude).to_radians();
    let theta = (point.longitude + 180.0).to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    Vec3::new(
        -radius * sin_phi * cos_theta,
        radius * cos_phi,
        radius * sin_phi * sin_theta,
    )
}

/// Base radial lift of an arc, as a fraction of the radius.
pub const ARC_BASE_LIFT: f64 = 0.05;
/// Extra lift added for a half-globe (antipodal) arc.
pub const ARC_DISTANCE_LIFT: f64 = 0.20;

/// Samples the shorter great-circle path from `a` to `b`, lifted off the
/// sphere along a sine profile.
///
/// Returns `segments + 1` points. The first and last samples sit on the
/// sphere at the endpoints' projections; the peak lift at `t = 0.5` grows
/// with the angular distance between the endpoints.
pub fn great_circle_arc(a: GeoPoint, b: GeoPoint, radius: f64, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    let va = project(a, 1.0).normalize();
    let vb = project(b, 1.0).normalize();

    let omega = va.dot(vb).clamp(-1.0, 1.0).acos();
    let sin_omega = omega.sin();
    let lift = ARC_BASE_LIFT + ARC_DISTANCE_LIFT * (omega / std::f64::consts::PI);

    // Antipodal endpoints have no unique great circle; sweep through any
    // perpendicular direction.
    let detour = if omega > std::f64::consts::PI - 1e-9 {
        let helper = if va.y.abs() < 0.9 { Vec3::UNIT_Y } else { Vec3::UNIT_Z };
        Some(va.cross(helper).normalize())
    } else {
        None
    };

    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let dir = if let Some(perp) = detour {
                let angle = omega * t;
                va * angle.cos() + perp * angle.sin()
            } else if sin_omega.abs() < 1e-9 {
                va.lerp(vb, t).normalize()
            } else {
                va * (((1.0 - t) * omega).sin() / sin_omega) + vb * ((t * omega).sin() / sin_omega)
            };
            let dir = dir.normalize();
            dir * (radius * (1.0 + lift * (std::f64::consts::PI * t).sin()))
        })
        .collect()
}
