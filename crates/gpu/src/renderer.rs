use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::{Mat3, Mat4, Vec3};
use foundation::time::Time;
use scene::components::{Drawable3D, Transform};
use scene::entity::EntityId;
use scene::picking::Ray;
use scene::world::World;

use crate::resources::{ResourceRegistry, Rgb};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera3D {
    pub fn look_at(position: Vec3, target: Vec3, fov_y_rad: f64, near: f64, far: f64) -> Self {
        Self {
            position,
            target,
            up: Vec3::UNIT_Y,
            fov_y_rad,
            aspect: 1.0,
            near,
            far,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_z0(self.fov_y_rad, self.aspect.max(1e-6), self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }

    /// World point to normalized device coordinates. `None` behind the eye.
    pub fn project_ndc(&self, p: Vec3) -> Option<[f64; 3]> {
        let [x, y, z, w] = self.view_proj().transform_point4(p);
        if w <= 1e-9 {
            return None;
        }
        Some([x / w, y / w, z / w])
    }

    /// Ray from the eye through an NDC position (`[-1, 1]`, y up).
    pub fn ray_through_ndc(&self, ndc_x: f64, ndc_y: f64) -> Ray {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        let half_h = (0.5 * self.fov_y_rad).tan();
        let half_w = half_h * self.aspect;
        let dir = forward + right * (ndc_x * half_w) + up * (ndc_y * half_h);
        Ray::new(self.position, dir.normalize())
    }
}

/// Drawing-surface size in CSS pixels plus the device pixel ratio in use.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height.max(1.0)
    }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round().max(1.0) as u32,
            (self.height * self.pixel_ratio).round().max(1.0) as u32,
        )
    }

    pub fn px_to_ndc(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x / self.width.max(1.0)) * 2.0 - 1.0,
            -((y / self.height.max(1.0)) * 2.0 - 1.0),
        )
    }

    pub fn ndc_to_px(&self, ndc_x: f64, ndc_y: f64) -> (f64, f64) {
        (
            (ndc_x * 0.5 + 0.5) * self.width,
            (1.0 - (ndc_y * 0.5 + 0.5)) * self.height,
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Directional light shining from `position` toward the origin.
    Directional { position: Vec3 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Rgb,
    pub intensity: f64,
}

impl Light {
    pub fn ambient(intensity: f64) -> Self {
        Self {
            kind: LightKind::Ambient,
            color: Rgb::WHITE,
            intensity,
        }
    }

    pub fn directional(position: Vec3, intensity: f64) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color: Rgb::WHITE,
            intensity,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderCommand {
    pub entity: EntityId,
    /// Transform in the rotating globe frame.
    pub transform: Transform,
    /// `transform.position` after the globe rotation.
    pub world_position: Vec3,
    pub drawable: Drawable3D,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub time: Time,
    pub clear_color: Rgb,
    pub view_proj: Mat4,
    pub globe_rotation: Mat3,
    pub lights: Vec<Light>,
    pub commands: Vec<RenderCommand>,
}

pub struct Renderer;

impl Renderer {
    /// Collects every visible drawable, in entity order.
    pub fn collect_3d(
        world: &World,
        camera: &Camera3D,
        globe_rotation: Mat3,
        lights: &[Light],
        clear_color: Rgb,
        time: Time,
    ) -> RenderFrame {
        let commands = world
            .drawables_3d()
            .into_iter()
            .map(|(entity, transform, drawable)| RenderCommand {
                entity,
                transform,
                world_position: globe_rotation.transform(transform.position),
                drawable,
            })
            .collect();

        RenderFrame {
            time,
            clear_color,
            view_proj: camera.view_proj(),
            globe_rotation,
            lights: lights.to_vec(),
            commands,
        }
    }
}

/// Screen-anchored label as handed to the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSprite {
    pub key: usize,
    pub text: String,
    pub badges: Vec<&'static str>,
    pub x_px: f64,
    pub y_px: f64,
    pub scale: f64,
    pub opacity: f64,
}

/// Primary 3D output bound to the host's drawing surface.
pub trait SurfaceRenderer {
    /// Resizes the backing store to `width x height` device pixels.
    fn set_size(&mut self, width: u32, height: u32);
    fn render(&mut self, frame: &RenderFrame, resources: &ResourceRegistry);
    fn dispose(&mut self);
}

/// 2D overlay that places labels over the 3D output. The overlay itself is
/// transparent to pointer input; only label hit regions are interactive.
pub trait LabelRenderer {
    /// Resizes the overlay to `width x height` CSS pixels.
    fn set_size(&mut self, width: f64, height: f64);
    fn render(&mut self, labels: &[LabelSprite]);
    fn dispose(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    SurfaceResized { width: u32, height: u32 },
    OverlayResized { width: f64, height: f64 },
    Scene { commands: usize, lights: usize },
    Labels { visible: usize },
    SurfaceDisposed,
    OverlayDisposed,
}

/// Shared, ordered log of what the recording renderers saw.
pub type RenderLog = Rc<RefCell<Vec<RenderEvent>>>;

/// Headless surface that records calls instead of drawing.
#[derive(Debug)]
pub struct RecordingSurface {
    log: RenderLog,
    disposed: bool,
    last_frame: Rc<RefCell<Option<RenderFrame>>>,
}

impl RecordingSurface {
    pub fn new(log: RenderLog) -> Self {
        Self {
            log,
            disposed: false,
            last_frame: Rc::new(RefCell::new(None)),
        }
    }

    /// Handle to the most recent frame, readable after the surface is moved.
    pub fn last_frame(&self) -> Rc<RefCell<Option<RenderFrame>>> {
        Rc::clone(&self.last_frame)
    }
}

impl SurfaceRenderer for RecordingSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        self.log
            .borrow_mut()
            .push(RenderEvent::SurfaceResized { width, height });
    }

    fn render(&mut self, frame: &RenderFrame, resources: &ResourceRegistry) {
        if self.disposed {
            return;
        }
        // Every command must reference live resources.
        let commands = frame
            .commands
            .iter()
            .filter(|c| resources.material(c.drawable.material()).is_some())
            .count();
        self.log.borrow_mut().push(RenderEvent::Scene {
            commands,
            lights: frame.lights.len(),
        });
        *self.last_frame.borrow_mut() = Some(frame.clone());
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.log.borrow_mut().push(RenderEvent::SurfaceDisposed);
        }
    }
}

/// Headless label overlay that records calls.
#[derive(Debug)]
pub struct RecordingOverlay {
    log: RenderLog,
    disposed: bool,
    last_labels: Rc<RefCell<Vec<LabelSprite>>>,
}

impl RecordingOverlay {
    pub fn new(log: RenderLog) -> Self {
        Self {
            log,
            disposed: false,
            last_labels: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn last_labels(&self) -> Rc<RefCell<Vec<LabelSprite>>> {
        Rc::clone(&self.last_labels)
    }
}

impl LabelRenderer for RecordingOverlay {
    fn set_size(&mut self, width: f64, height: f64) {
        if self.disposed {
            return;
        }
        self.log
            .borrow_mut()
            .push(RenderEvent::OverlayResized { width, height });
    }

    fn render(&mut self, labels: &[LabelSprite]) {
        if self.disposed {
            return;
        }
        self.log.borrow_mut().push(RenderEvent::Labels {
            visible: labels.len(),
        });
        *self.last_labels.borrow_mut() = labels.to_vec();
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.log.borrow_mut().push(RenderEvent::OverlayDisposed);
        }
    }
}
