use std::f64::consts::{PI, TAU};

use foundation::math::{Mat3, Vec3};
use foundation::time::Time;
use gpu::procedural::{generate_glow_sprite, generate_surface_texture, generate_surface_texture_seeded};
use gpu::renderer::{Camera3D, LabelRenderer, LabelSprite, Light, Renderer, SurfaceRenderer, Viewport};
use gpu::resources::{Geometry, Material, Ownership, ResourceRegistry, Rgb, TextureId};
use gpu::textures::Texture;
use layers::data::GlobeMode;
use layers::layer::{LayerAssets, LayerContext};
use scene::World;
use scene::components::{BoundingSphere, Drawable3D, GeometryId, MaterialId};
use scene::entity::EntityId;
use scene::picking::Ray;
use scene::prefabs::globe::{spawn_globe_surface, spawn_graticule};
use tracing::debug;

use crate::config::{GlobeConfig, GlobeSettings};

pub const BACKGROUND: Rgb = Rgb::from_hex(0x050505);
const OCEAN: Rgb = Rgb::from_hex(0x0a4a7a);
const INK_WASH: Rgb = Rgb::from_hex(0x3b3b3b);

const RIM_LIGHT: usize = 2;

/// Mode-dependent look of the globe body, grid, lights and labels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ModeStyle {
    pub graticule_opacity: f64,
    pub rim_intensity: f64,
    pub label_opacity: f64,
}

impl ModeStyle {
    pub fn of(mode: GlobeMode) -> Self {
        match mode {
            GlobeMode::Night => Self {
                graticule_opacity: 0.12,
                rim_intensity: 0.55,
                label_opacity: 1.0,
            },
            GlobeMode::Satellite => Self {
                graticule_opacity: 0.08,
                rim_intensity: 0.62,
                label_opacity: 0.85,
            },
        }
    }
}

fn lighting_rig(mode: GlobeMode) -> Vec<Light> {
    vec![
        Light::ambient(0.22),
        Light::directional(Vec3::new(6.0, 8.0, 6.0), 1.25),
        Light::directional(Vec3::new(-10.0, 2.0, -10.0), ModeStyle::of(mode).rim_intensity),
        Light::directional(Vec3::new(0.0, -6.0, 8.0), 0.18),
    ]
}

/// Latitude rings (closed) followed by meridians (pole to pole).
pub fn graticule_lines(settings: &GlobeSettings) -> Vec<Geometry> {
    let r = settings.radius;
    let n = settings.graticule_points.max(2) as usize;
    let rings = settings.graticule_rings;
    let mut lines = Vec::new();

    for i in 1..rings {
        let lat = (-80.0 + 160.0 * f64::from(i) / f64::from(rings)).to_radians();
        let (ring_r, y) = (r * lat.cos(), r * lat.sin());
        let points = (0..n)
            .map(|k| {
                let t = k as f64 / n as f64 * TAU;
                Vec3::new(t.cos() * ring_r, y, t.sin() * ring_r)
            })
            .collect();
        lines.push(Geometry::Polyline { points, closed: true });
    }

    let meridians = settings.graticule_meridians.max(1);
    for i in 0..meridians {
        let lng = f64::from(i) / f64::from(meridians) * TAU;
        let points = (0..n)
            .map(|k| {
                let t = k as f64 / (n - 1) as f64 * PI - PI / 2.0;
                Vec3::new(t.cos() * lng.cos() * r, t.sin() * r, t.cos() * lng.sin() * r)
            })
            .collect();
        lines.push(Geometry::Polyline { points, closed: false });
    }
    lines
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct SurfaceMaterials {
    night: MaterialId,
    satellite: MaterialId,
    graticule: MaterialId,
}

/// Owns the render target lifecycle: world, resources, camera, lights and
/// both renderers. Shared resources are created here and released only by
/// [`SceneManager::dispose`].
pub struct SceneManager {
    world: World,
    resources: ResourceRegistry,
    camera: Camera3D,
    viewport: Viewport,
    sized: bool,
    surface: Box<dyn SurfaceRenderer>,
    overlay: Box<dyn LabelRenderer>,
    lights: Vec<Light>,
    root: EntityId,
    globe: EntityId,
    globe_body: EntityId,
    graticule: EntityId,
    sphere: GeometryId,
    materials: SurfaceMaterials,
    fallback_texture: TextureId,
    imagery_texture: Option<TextureId>,
    layer_assets: LayerAssets,
    mode: GlobeMode,
    radius: f64,
    max_pixel_ratio: f64,
    disposed: bool,
    frames: u64,
}

impl SceneManager {
    /// Builds the scene graph and sizes both renderers to the container. A
    /// zero-sized container leaves the renderers unsized until `resize`.
    pub fn initialize(
        config: &GlobeConfig,
        mode: GlobeMode,
        container_size: (f64, f64),
        device_pixel_ratio: f64,
        surface: Box<dyn SurfaceRenderer>,
        overlay: Box<dyn LabelRenderer>,
    ) -> Self {
        let mut world = World::new();
        let mut resources = ResourceRegistry::new();
        let radius = config.globe.radius;

        let surface_tex = match config.textures.seed {
            Some(seed) => generate_surface_texture_seeded(config.textures.surface_size, seed),
            None => generate_surface_texture(config.textures.surface_size),
        };
        let fallback_texture = resources.add_texture(surface_tex, Ownership::Shared);
        let glow = resources.add_texture(generate_glow_sprite(config.textures.glow_size), Ownership::Shared);
        let layer_assets = LayerAssets::create(&mut resources, glow);

        let segments = config.globe.sphere_segments;
        let sphere = resources.add_geometry(
            Geometry::Sphere {
                width_segments: segments,
                height_segments: segments,
            },
            Ownership::Shared,
        );
        let style = ModeStyle::of(mode);
        let materials = SurfaceMaterials {
            night: resources.add_material(
                Material::standard(OCEAN)
                    .with_surface(0.85, 0.08)
                    .with_map(fallback_texture),
                Ownership::Shared,
            ),
            satellite: resources.add_material(
                Material::standard(INK_WASH)
                    .with_surface(0.95, 0.0)
                    .with_map(fallback_texture),
                Ownership::Shared,
            ),
            graticule: resources.add_material(
                Material::line(Rgb::WHITE, style.graticule_opacity),
                Ownership::Shared,
            ),
        };

        let root = world.spawn();
        let globe = world.spawn_child(root);
        let body_material = match mode {
            GlobeMode::Night => materials.night,
            GlobeMode::Satellite => materials.satellite,
        };
        let globe_body = spawn_globe_surface(&mut world, globe, sphere, body_material, radius);
        let line_ids: Vec<GeometryId> = graticule_lines(&config.globe)
            .into_iter()
            .map(|g| resources.add_geometry(g, Ownership::Shared))
            .collect();
        let graticule = spawn_graticule(&mut world, globe, &line_ids, materials.graticule);

        let camera = Camera3D::look_at(
            Vec3::new(0.0, 0.0, config.camera.initial_distance),
            Vec3::ZERO,
            config.fov_y_rad(),
            config.camera.near,
            config.camera.far,
        );

        let mut manager = Self {
            world,
            resources,
            camera,
            viewport: Viewport::new(1.0, 1.0, 1.0),
            sized: false,
            surface,
            overlay,
            lights: lighting_rig(mode),
            root,
            globe,
            globe_body,
            graticule,
            sphere,
            materials,
            fallback_texture,
            imagery_texture: None,
            layer_assets,
            mode,
            radius,
            max_pixel_ratio: config.camera.max_pixel_ratio,
            disposed: false,
            frames: 0,
        };
        manager.resize(container_size.0, container_size.1, device_pixel_ratio);
        manager
    }

    /// Re-derives the camera aspect and both renderer sizes. Unmeasurable
    /// sizes are skipped; the previous size stays in effect.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        if self.disposed {
            return false;
        }
        if !(width.is_finite() && height.is_finite() && width >= 1.0 && height >= 1.0) {
            debug!(width, height, "skipping resize of unmeasurable container");
            return false;
        }
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.max_pixel_ratio)
        } else {
            1.0
        };
        self.viewport = Viewport::new(width, height, ratio);
        self.camera.aspect = self.viewport.aspect();
        let (pw, ph) = self.viewport.physical_size();
        self.surface.set_size(pw, ph);
        self.overlay.set_size(width, height);
        self.sized = true;
        true
    }

    /// Renders the 3D scene, then the label overlay.
    pub fn render_frame(&mut self, time: Time, rotation: Mat3, labels: &[LabelSprite]) -> bool {
        if self.disposed {
            return false;
        }
        let frame = Renderer::collect_3d(&self.world, &self.camera, rotation, &self.lights, BACKGROUND, time);
        self.surface.render(&frame, &self.resources);
        self.overlay.render(labels);
        self.frames += 1;
        true
    }

    /// Releases renderers, the scene graph and every resource. Returns
    /// `false` when already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.surface.dispose();
        self.overlay.dispose();
        self.world.despawn_recursive(self.root);
        let released = self.resources.dispose_all();
        self.imagery_texture = None;
        self.disposed = true;
        debug!(released, "scene disposed");
        true
    }

    pub fn set_mode(&mut self, mode: GlobeMode) {
        if self.disposed || mode == self.mode {
            return;
        }
        let style = ModeStyle::of(mode);
        let body = match mode {
            GlobeMode::Night => self.materials.night,
            GlobeMode::Satellite => self.materials.satellite,
        };
        self.world
            .set_drawable_3d(self.globe_body, Drawable3D::mesh(self.sphere, body));
        if let Some(grid) = self.resources.material_mut(self.materials.graticule) {
            *grid = grid.clone().with_opacity(style.graticule_opacity);
        }
        if let Some(rim) = self.lights.get_mut(RIM_LIGHT) {
            rim.intensity = style.rim_intensity;
        }
        self.mode = mode;
    }

    /// Swaps loaded imagery into both surface materials. Each map is
    /// replaced in one step, so no frame renders without a texture. Earlier
    /// imagery is released; the procedural fallback lives until teardown.
    pub fn bind_imagery(&mut self, texture: Texture) -> Option<TextureId> {
        if self.disposed {
            return None;
        }
        let id = self.resources.add_texture(texture, Ownership::Shared);
        for material in [self.materials.night, self.materials.satellite] {
            if let Some(material) = self.resources.material_mut(material) {
                material.map = Some(id);
            }
        }
        if let Some(previous) = self.imagery_texture.replace(id)
            && let Err(err) = self.resources.dispose_shared_texture(previous)
        {
            debug!(%err, "previous imagery already released");
        }
        Some(id)
    }

    /// Material the globe body is drawn with in the current mode.
    pub fn body_material(&self) -> Option<MaterialId> {
        self.world.drawable_3d(self.globe_body).map(|d| d.material())
    }

    /// Texture currently bound to the globe body's material.
    pub fn surface_texture(&self) -> Option<TextureId> {
        self.body_material()
            .and_then(|id| self.resources.material(id))
            .and_then(|m| m.map)
    }

    pub fn fallback_texture(&self) -> TextureId {
        self.fallback_texture
    }

    pub fn layer_assets(&self) -> &LayerAssets {
        &self.layer_assets
    }

    pub fn glow_texture(&self) -> TextureId {
        self.layer_assets.glow_texture
    }

    pub fn set_camera_distance(&mut self, distance: f64) {
        self.camera.position = Vec3::new(0.0, 0.0, distance);
    }

    /// World-space ray through a CSS-pixel position.
    pub fn ray_at(&self, x_px: f64, y_px: f64) -> Option<Ray> {
        if !self.sized || !(x_px.is_finite() && y_px.is_finite()) {
            return None;
        }
        let (nx, ny) = self.viewport.px_to_ndc(x_px, y_px);
        Some(self.camera.ray_through_ndc(nx, ny))
    }

    /// Splits the manager into what a layer rebuild needs.
    pub fn layer_context(&mut self) -> LayerContext<'_> {
        LayerContext {
            world: &mut self.world,
            resources: &mut self.resources,
            assets: &self.layer_assets,
            globe_radius: self.radius,
        }
    }

    pub fn globe_bounds(&self) -> BoundingSphere {
        BoundingSphere::new(Vec3::ZERO, self.radius)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_sized(&self) -> bool {
        self.sized
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Group everything that turns with the globe hangs from.
    pub fn globe_group(&self) -> EntityId {
        self.globe
    }

    pub fn graticule(&self) -> EntityId {
        self.graticule
    }

    pub fn globe_body(&self) -> EntityId {
        self.globe_body
    }

    pub fn mode(&self) -> GlobeMode {
        self.mode
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
