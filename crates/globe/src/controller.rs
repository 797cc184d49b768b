//! Drag-rotate / inertia / wheel-zoom camera controller.
//!
//! The globe rotates under a fixed camera on the +Z axis. Pointer drags turn
//! the globe (yaw about Y, pitch about X); releasing keeps a fraction of the
//! last step as angular velocity, which decays each idle frame. The wheel
//! moves the camera along Z in fixed steps.

use std::f64::consts::TAU;

use foundation::math::{Mat3, Vec3};

use crate::config::{CameraConfig, InteractionConfig};

/// Camera/globe pose read by the renderer every frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    /// Camera distance from the globe centre.
    pub distance: f64,
    /// Globe rotation about Y (radians), wrapped to `[0, 2π)`.
    pub yaw: f64,
    /// Globe rotation about X (radians), clamped to the pitch limit.
    pub pitch: f64,
    /// Per-frame `[yaw, pitch]` increments applied while idle.
    pub velocity: [f64; 2],
    pub dragging: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging { last_px: [f64; 2] },
}

#[derive(Debug, Clone)]
pub struct GlobeController {
    yaw: f64,
    pitch: f64,
    velocity: [f64; 2],
    distance: f64,
    drag: DragState,
    camera: CameraConfig,
    interaction: InteractionConfig,
}

impl GlobeController {
    pub fn new(camera: CameraConfig, interaction: InteractionConfig) -> Self {
        let distance = camera
            .initial_distance
            .clamp(camera.min_distance, camera.max_distance);
        Self {
            yaw: 0.0,
            pitch: 0.0,
            velocity: [0.0, 0.0],
            distance,
            drag: DragState::Idle,
            camera,
            interaction,
        }
    }

    /// `idle -> dragging`. Residual velocity is left alone until the first
    /// move replaces it.
    pub fn on_pointer_down(&mut self, pos_px: [f64; 2]) {
        if !finite2(pos_px) {
            return;
        }
        self.drag = DragState::Dragging { last_px: pos_px };
    }

    pub fn on_pointer_move(&mut self, pos_px: [f64; 2]) {
        let DragState::Dragging { last_px } = self.drag else {
            return;
        };
        if !finite2(pos_px) {
            return;
        }
        let dx = pos_px[0] - last_px[0];
        let dy = pos_px[1] - last_px[1];
        self.drag = DragState::Dragging { last_px: pos_px };

        let rs = self.interaction.rotate_speed;
        self.yaw = wrap_yaw(self.yaw + dx * rs);
        self.pitch = self.clamp_pitch(self.pitch + dy * rs);

        let gain = rs * self.interaction.inertia_gain;
        self.velocity = [dx * gain, dy * gain];
    }

    /// `dragging -> idle`.
    pub fn on_pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Leaving the surface ends a drag exactly like a release.
    pub fn on_pointer_leave(&mut self) {
        self.on_pointer_up();
    }

    /// One wheel tick per event; only the sign of `delta_y` matters.
    pub fn on_wheel(&mut self, delta_y: f64) {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return;
        }
        let step = delta_y.signum() * self.camera.wheel_step;
        self.distance = (self.distance + step).clamp(self.camera.min_distance, self.camera.max_distance);
    }

    /// Per-frame update: while idle the velocity is applied and then damped.
    /// The damping is geometric, so motion settles without a hard stop.
    pub fn update(&mut self) {
        if self.is_dragging() {
            return;
        }
        self.yaw = wrap_yaw(self.yaw + self.velocity[0]);
        self.pitch = self.clamp_pitch(self.pitch + self.velocity[1]);
        let damping = self.interaction.damping;
        self.velocity = [self.velocity[0] * damping, self.velocity[1] * damping];
    }

    /// True when a click may select something: the globe is not still
    /// spinning from a flick.
    pub fn click_allowed(&self) -> bool {
        let eps = self.interaction.click_velocity_epsilon;
        self.velocity[0].abs() <= eps && self.velocity[1].abs() <= eps
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            distance: self.distance,
            yaw: self.yaw,
            pitch: self.pitch,
            velocity: self.velocity,
            dragging: self.is_dragging(),
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Globe-frame to world rotation.
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_pitch_yaw(self.pitch, self.yaw)
    }

    pub fn eye_position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    fn clamp_pitch(&self, pitch: f64) -> f64 {
        let limit = self.interaction.pitch_limit;
        pitch.clamp(-limit, limit)
    }
}

fn finite2(p: [f64; 2]) -> bool {
    p[0].is_finite() && p[1].is_finite()
}

/// Yaw kept in `[0, 2π)`.
fn wrap_yaw(yaw: f64) -> f64 {
    let wrapped = yaw.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;

    use super::GlobeController;
    use foundation::math::{Mat3, Vec3};
    use crate::config::{CameraConfig, InteractionConfig};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    fn controller() -> GlobeController {
        GlobeController::new(CameraConfig::default(), InteractionConfig::default())
    }

    #[test]
    fn drag_rotates_and_records_velocity() {
        let mut c = controller();
        c.on_pointer_down([100.0, 100.0]);
        c.on_pointer_move([110.0, 95.0]);
        let s = c.state();
        assert!(s.dragging);
        assert_close(s.yaw, 10.0 * 0.004);
        assert_close(s.pitch, -5.0 * 0.004);
        assert_close(s.velocity[0], 10.0 * 0.004 * 0.35);
        assert_close(s.velocity[1], -5.0 * 0.004 * 0.35);
    }

    #[test]
    fn yaw_wraps_without_changing_the_rotation() {
        let mut c = controller();
        c.on_pointer_down([0.0, 0.0]);
        let mut unwrapped = 0.0;
        for i in 1..=40 {
            c.on_pointer_move([-(i as f64) * 100.0, 0.0]);
            unwrapped -= 100.0 * 0.004;
            let yaw = c.state().yaw;
            assert!((0.0..TAU).contains(&yaw), "yaw {yaw}");

            let point = Vec3::new(0.3, 0.2, 1.0);
            let a = c.rotation().transform(point);
            let b = Mat3::from_pitch_yaw(0.0, unwrapped).transform(point);
            assert!((a - b).length() < 1e-9);
        }
        c.on_pointer_up();
        for _ in 0..500 {
            c.update();
            assert!((0.0..TAU).contains(&c.state().yaw));
        }
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut c = controller();
        c.on_pointer_move([500.0, 500.0]);
        assert_eq!(c.state().yaw, 0.0);
        assert!(!c.is_dragging());
    }

    #[test]
    fn pitch_never_exceeds_limit() {
        let mut c = controller();
        c.on_pointer_down([0.0, 0.0]);
        for i in 1..=200 {
            c.on_pointer_move([0.0, i as f64 * 40.0]);
            assert!(c.state().pitch <= 0.9);
        }
        c.on_pointer_up();
        for _ in 0..100 {
            c.update();
            assert!(c.state().pitch.abs() <= 0.9);
        }
        assert_close(c.state().pitch, 0.9);
    }

    #[test]
    fn wheel_is_clamped() {
        let mut c = controller();
        for _ in 0..50 {
            c.on_wheel(-120.0);
            assert!(c.distance() >= 2.1);
        }
        assert_close(c.distance(), 2.1);
        for _ in 0..50 {
            c.on_wheel(3.0);
            assert!(c.distance() <= 5.6);
        }
        assert_close(c.distance(), 5.6);
        c.on_wheel(f64::NAN);
        assert_close(c.distance(), 5.6);
    }

    #[test]
    fn wheel_moves_one_fixed_step() {
        let mut c = controller();
        c.on_wheel(1.0);
        assert_close(c.distance(), 4.2 + 0.18);
        c.on_wheel(-400.0);
        assert_close(c.distance(), 4.2);
    }

    #[test]
    fn inertia_decays_without_stopping() {
        let mut c = controller();
        c.on_pointer_down([0.0, 0.0]);
        c.on_pointer_move([50.0, 0.0]);
        c.on_pointer_up();
        let v0 = c.state().velocity[0];
        let yaw0 = c.state().yaw;

        c.update();
        assert_close(c.state().yaw, yaw0 + v0);
        assert_close(c.state().velocity[0], v0 * 0.93);

        let mut prev = c.state().velocity[0];
        for _ in 0..60 {
            c.update();
            let v = c.state().velocity[0];
            assert!(v < prev && v > 0.0);
            prev = v;
        }
    }

    #[test]
    fn velocity_is_frozen_while_dragging() {
        let mut c = controller();
        c.on_pointer_down([0.0, 0.0]);
        c.on_pointer_move([20.0, 0.0]);
        let before = c.state();
        c.update();
        assert_eq!(c.state(), before);
        c.on_pointer_leave();
        assert!(!c.is_dragging());
    }

    #[test]
    fn clicks_wait_for_the_globe_to_settle() {
        let mut c = controller();
        assert!(c.click_allowed());
        c.on_pointer_down([0.0, 0.0]);
        c.on_pointer_move([40.0, 0.0]);
        c.on_pointer_up();
        assert!(!c.click_allowed());
        let mut frames = 0;
        while !c.click_allowed() {
            c.update();
            frames += 1;
        }
        // 0.056 * 0.93^n <= 0.001
        assert_eq!(frames, 56);
    }
}
