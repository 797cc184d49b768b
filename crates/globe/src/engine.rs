//! Public façade: one globe instance bound to a host container.
//!
//! The engine is driven entirely by its host on a single thread. Input
//! handlers mutate camera state synchronously; `tick` (called from the
//! host's frame callback) applies inertia, animates layers, runs the label
//! LOD pass and renders.

use foundation::math::{GeoPoint, project};
use gpu::renderer::{LabelRenderer, LabelSprite, SurfaceRenderer};
use layers::cities::CityLabel;
use layers::data::{Beacon, City, GlobeMode, LayerToggles, resolve_beacons, resolve_cities};
use layers::labels::{LabelProjector, LabelStyle};
use layers::layer::{Layer, LayerId};
use layers::registry::{LayerRegistry, RebuildCounts};
use layers::symbology::PINS_STYLE;
use runtime::animation::AnimationLoop;
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use runtime::listeners::ListenerHandle;
use runtime::metrics::{Metrics, MetricsSnapshot};
use scene::picking::{PickOptions, Ray, pick_screen};
use tracing::{debug, info, warn};

use crate::config::GlobeConfig;
use crate::controller::{CameraState, GlobeController};
use crate::error::GlobeError;
use crate::events::{
    BEACON_CLICKS, CITY_CLICKS, CLICKS_SWALLOWED, FRAMES_RENDERED, GlobeEvent, IMAGERY_BOUND,
    IMAGERY_FALLBACKS, LABELS_VISIBLE, RESIZES_SKIPPED, rebuild_metric,
};
use crate::host::{HostChild, HostContainer, ListenerKind};
use crate::lod::{CameraProjector, LabelPass, LodView, run_label_pass};
use crate::manager::{ModeStyle, SceneManager};
use crate::texture_loader::{TextureLoader, TextureSource};

pub type BeaconCallback = Box<dyn FnMut(&Beacon)>;
pub type CityCallback = Box<dyn FnMut(&City)>;

/// Initial state of a globe.
pub struct GlobeOptions {
    pub config: GlobeConfig,
    pub layers: LayerToggles,
    pub beacons: Vec<Beacon>,
    /// `None` uses [`City::defaults`].
    pub cities: Option<Vec<City>>,
    pub mode: GlobeMode,
    pub imagery_url: Option<String>,
    /// External imagery is only fetched with the user's consent.
    pub external_imagery_allowed: bool,
    pub on_beacon_click: Option<BeaconCallback>,
    pub on_city_click: Option<CityCallback>,
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self {
            config: GlobeConfig::default(),
            layers: LayerToggles::default(),
            beacons: Vec::new(),
            cities: None,
            mode: GlobeMode::default(),
            imagery_url: None,
            external_imagery_allowed: false,
            on_beacon_click: None,
            on_city_click: None,
        }
    }
}

impl GlobeOptions {
    pub fn with_config(mut self, config: GlobeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_layers(mut self, layers: LayerToggles) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_beacons(mut self, beacons: Vec<Beacon>) -> Self {
        self.beacons = beacons;
        self
    }

    pub fn with_cities(mut self, cities: Vec<City>) -> Self {
        self.cities = Some(cities);
        self
    }

    pub fn with_mode(mut self, mode: GlobeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_imagery(mut self, url: impl Into<String>, allowed: bool) -> Self {
        self.imagery_url = Some(url.into());
        self.external_imagery_allowed = allowed;
        self
    }

    pub fn on_beacon_click(mut self, f: impl FnMut(&Beacon) + 'static) -> Self {
        self.on_beacon_click = Some(Box::new(f));
        self
    }

    pub fn on_city_click(mut self, f: impl FnMut(&City) + 'static) -> Self {
        self.on_city_click = Some(Box::new(f));
        self
    }
}

/// Platform pieces the engine binds to.
pub struct Platform {
    pub host: Box<dyn HostContainer>,
    pub surface: Box<dyn SurfaceRenderer>,
    pub overlay: Box<dyn LabelRenderer>,
    pub textures: Box<dyn TextureSource>,
}

/// A data/control snapshot. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobeUpdate {
    pub beacons: Option<Vec<Beacon>>,
    pub cities: Option<Vec<City>>,
    pub layers: Option<LayerToggles>,
    pub mode: Option<GlobeMode>,
    pub imagery_url: Option<String>,
}

/// Host input, in CSS pixels relative to the container.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    Wheel { delta_y: f64 },
    Click { x: f64, y: f64 },
    Resize {
        width: f64,
        height: f64,
        device_pixel_ratio: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputResponse {
    /// The engine is destroyed.
    Ignored,
    Handled,
    BeaconSelected(String),
    CitySelected(String),
    /// Click arrived while the globe was still spinning.
    ClickSwallowed,
    NoHit,
}

pub struct GlobeEngine {
    config: GlobeConfig,
    host: Box<dyn HostContainer>,
    listeners: Vec<ListenerHandle>,
    manager: SceneManager,
    layers: LayerRegistry,
    controller: GlobeController,
    textures: TextureLoader,
    animation: AnimationLoop,
    beacons: Vec<Beacon>,
    cities: Vec<City>,
    imagery_url: Option<String>,
    label_pass: LabelPass,
    on_beacon_click: Option<BeaconCallback>,
    on_city_click: Option<CityCallback>,
    events: EventBus<GlobeEvent>,
    metrics: Metrics,
    destroyed: bool,
}

impl GlobeEngine {
    /// Builds the scene inside `platform.host`, generates all layers and
    /// starts the animation loop.
    pub fn create(options: GlobeOptions, platform: Platform) -> Result<Self, GlobeError> {
        if let Err(err) = options.config.validate() {
            warn!(%err, "rejecting globe configuration");
            return Err(err);
        }
        let GlobeOptions {
            config,
            layers: toggles,
            beacons,
            cities,
            mode,
            imagery_url,
            external_imagery_allowed,
            on_beacon_click,
            on_city_click,
        } = options;

        let mut host = platform.host;
        let size = host.size();
        let mut manager = SceneManager::initialize(
            &config,
            mode,
            size,
            host.device_pixel_ratio(),
            platform.surface,
            platform.overlay,
        );
        host.attach(HostChild::Surface);
        host.attach(HostChild::LabelOverlay);
        let listeners = ListenerKind::ALL
            .iter()
            .map(|kind| host.add_listener(*kind))
            .collect();

        let globe_group = manager.globe_group();
        let layers = LayerRegistry::new(
            manager.world_mut(),
            globe_group,
            config.trails.to_layer_config(),
            LabelStyle::default(),
        );
        let controller = GlobeController::new(config.camera.clone(), config.interaction.clone());
        manager.set_camera_distance(controller.distance());

        let mut engine = Self {
            textures: TextureLoader::new(platform.textures, external_imagery_allowed),
            config,
            host,
            listeners,
            manager,
            layers,
            controller,
            animation: AnimationLoop::new(),
            beacons: Vec::new(),
            cities: Vec::new(),
            imagery_url: None,
            label_pass: LabelPass::default(),
            on_beacon_click,
            on_city_click,
            events: EventBus::new(),
            metrics: Metrics::new(),
            destroyed: false,
        };

        engine.emit(GlobeEvent::Created {
            width: size.0,
            height: size.1,
        });
        engine.rebuild_beacons(resolve_beacons(&beacons));
        engine.rebuild_cities(resolve_cities(&cities.unwrap_or_else(City::defaults)));
        engine.apply_toggles(toggles);
        if let Some(url) = imagery_url {
            engine.request_imagery(url);
        }
        engine.animation.start();

        info!(
            width = size.0,
            height = size.1,
            beacons = engine.beacons.len(),
            cities = engine.cities.len(),
            "globe created"
        );
        Ok(engine)
    }

    /// Applies a snapshot. Layers are rebuilt only for data that actually
    /// changed; toggles and mode are cheap flag flips.
    pub fn update(&mut self, update: GlobeUpdate) -> Result<(), GlobeError> {
        if self.destroyed {
            return Err(GlobeError::Destroyed);
        }
        if let Some(beacons) = update.beacons {
            let resolved = resolve_beacons(&beacons);
            if resolved != self.beacons {
                self.rebuild_beacons(resolved);
            }
        }
        if let Some(cities) = update.cities {
            let resolved = resolve_cities(&cities);
            if resolved != self.cities {
                self.rebuild_cities(resolved);
            }
        }
        if let Some(toggles) = update.layers {
            self.apply_toggles(toggles);
        }
        if let Some(mode) = update.mode
            && mode != self.manager.mode()
        {
            self.manager.set_mode(mode);
            self.emit(GlobeEvent::ModeChanged(mode));
        }
        if let Some(url) = update.imagery_url
            && self.imagery_url.as_deref() != Some(url.as_str())
        {
            self.request_imagery(url);
        }
        Ok(())
    }

    /// One animation frame. Returns `false` once the loop has stopped.
    pub fn tick(&mut self, dt_s: f64) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(frame) = self.animation.tick(dt_s) else {
            return false;
        };

        self.drain_imagery();
        self.controller.update();
        self.manager.set_camera_distance(self.controller.distance());
        self.layers.animate(self.manager.world_mut(), frame.dt_s);
        self.run_lod();

        let rotation = self.controller.rotation();
        let rendered = self
            .manager
            .render_frame(frame.time, rotation, &self.label_pass.sprites);
        if rendered {
            self.metrics.inc(FRAMES_RENDERED);
        }
        rendered
    }

    pub fn handle_input(&mut self, event: InputEvent) -> InputResponse {
        if self.destroyed {
            return InputResponse::Ignored;
        }
        match event {
            InputEvent::PointerDown { x, y } => {
                // Labels take the press so it never turns into a drag.
                if self.label_at(x, y).is_none() {
                    self.controller.on_pointer_down([x, y]);
                }
            }
            InputEvent::PointerMove { x, y } => self.controller.on_pointer_move([x, y]),
            InputEvent::PointerUp => self.controller.on_pointer_up(),
            InputEvent::PointerLeave => self.controller.on_pointer_leave(),
            InputEvent::Wheel { delta_y } => {
                self.controller.on_wheel(delta_y);
                self.manager.set_camera_distance(self.controller.distance());
            }
            InputEvent::Click { x, y } => return self.handle_click(x, y),
            InputEvent::Resize {
                width,
                height,
                device_pixel_ratio,
            } => self.resize(width, height, device_pixel_ratio),
        }
        InputResponse::Handled
    }

    /// Re-measures the host container; wired to the resize observer.
    pub fn on_host_resized(&mut self) {
        if self.destroyed {
            return;
        }
        let (width, height) = self.host.size();
        let ratio = self.host.device_pixel_ratio();
        self.resize(width, height, ratio);
    }

    /// Stops the loop, releases every resource and unregisters from the
    /// host. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.animation.stop();
        self.textures.dispose();

        let mut ctx = self.manager.layer_context();
        self.layers.clear(&mut ctx);
        self.manager.dispose();

        for handle in self.listeners.drain(..) {
            if !self.host.remove_listener(handle) {
                debug!(?handle, "listener was already removed");
            }
        }
        self.host.detach(HostChild::Surface);
        self.host.detach(HostChild::LabelOverlay);
        self.label_pass = LabelPass::default();

        self.emit(GlobeEvent::Destroyed);
        info!(frames = self.metrics.counter(FRAMES_RENDERED), "globe destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    pub fn camera_state(&self) -> CameraState {
        self.controller.state()
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn beacons(&self) -> &[Beacon] {
        &self.beacons
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn toggles(&self) -> LayerToggles {
        self.layers.toggles()
    }

    pub fn mode(&self) -> GlobeMode {
        self.manager.mode()
    }

    pub fn rebuild_counts(&self) -> RebuildCounts {
        self.layers.rebuild_counts()
    }

    /// Labels shown by the last frame.
    pub fn visible_labels(&self) -> &[LabelSprite] {
        &self.label_pass.sprites
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn scene(&self) -> &SceneManager {
        &self.manager
    }

    pub fn events(&self) -> &[Event<GlobeEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<GlobeEvent>> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Where a point just above the surface currently appears on screen.
    pub fn screen_position(&self, point: GeoPoint) -> Option<[f64; 2]> {
        let point = point.sanitized()?;
        let local = project(point, PINS_STYLE.anchor_radius(self.manager.radius()));
        let world = self.controller.rotation().transform(local);
        let projector = CameraProjector {
            camera: self.manager.camera(),
            viewport: self.manager.viewport(),
        };
        projector.project(world)
    }

    fn frame(&self) -> Frame {
        self.animation.last_frame().unwrap_or_else(|| Frame::first(0.0))
    }

    fn emit(&mut self, event: GlobeEvent) {
        let frame = self.frame();
        self.events.emit(frame, event);
    }

    fn rebuild_beacons(&mut self, beacons: Vec<Beacon>) {
        let mut ctx = self.manager.layer_context();
        self.layers.rebuild_beacons(&mut ctx, &beacons);

        let counts = [
            (LayerId::Pins, self.layers.pins.pin_count()),
            (LayerId::Heat, beacons.len()),
            (LayerId::Trails, self.layers.trails.arcs().len()),
        ];
        for (layer, objects) in counts {
            self.metrics.inc(rebuild_metric(layer));
            self.emit(GlobeEvent::LayerRebuilt { layer, objects });
        }
        self.beacons = beacons;
    }

    fn rebuild_cities(&mut self, cities: Vec<City>) {
        let mut ctx = self.manager.layer_context();
        self.layers.rebuild_cities(&mut ctx, &cities);
        self.metrics.inc(rebuild_metric(LayerId::Cities));
        self.emit(GlobeEvent::LayerRebuilt {
            layer: LayerId::Cities,
            objects: self.layers.cities.labels().len(),
        });
        self.cities = cities;
        // Hit regions index the label list that was just replaced.
        self.run_lod();
    }

    fn apply_toggles(&mut self, toggles: LayerToggles) {
        let changed = toggles != self.layers.toggles();
        self.layers.apply_toggles(self.manager.world_mut(), toggles);
        if changed {
            self.emit(GlobeEvent::TogglesApplied(toggles));
            self.run_lod();
        }
    }

    /// Visible label under the pointer, if it belongs to the current list.
    fn label_at(&self, x: f64, y: f64) -> Option<&CityLabel> {
        if !self.layers.is_enabled(LayerId::Cities) {
            return None;
        }
        self.label_pass
            .current_label_at(self.layers.cities.labels(), x, y)
    }

    fn request_imagery(&mut self, url: String) {
        self.imagery_url = Some(url.clone());
        match self.textures.request(&url) {
            Ok(_) => self.emit(GlobeEvent::ImageryRequested { url }),
            Err(err) => {
                debug!(%url, %err, "imagery not requested, keeping procedural surface");
                self.metrics.inc(IMAGERY_FALLBACKS);
                self.emit(GlobeEvent::ImageryFallback {
                    url,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn drain_imagery(&mut self) {
        for load in self.textures.take_completed() {
            match load.result {
                Ok(texture) => {
                    if self.manager.bind_imagery(texture).is_some() {
                        self.metrics.inc(IMAGERY_BOUND);
                        self.emit(GlobeEvent::ImageryBound { url: load.url });
                    }
                }
                Err(err) => {
                    debug!(url = %load.url, %err, "imagery unavailable, keeping procedural surface");
                    self.metrics.inc(IMAGERY_FALLBACKS);
                    self.emit(GlobeEvent::ImageryFallback {
                        url: load.url,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        if self.manager.resize(width, height, device_pixel_ratio) {
            self.emit(GlobeEvent::Resized { width, height });
        } else {
            self.metrics.inc(RESIZES_SKIPPED);
            self.emit(GlobeEvent::ResizeSkipped);
        }
    }

    fn run_lod(&mut self) {
        let camera = *self.manager.camera();
        let viewport = *self.manager.viewport();
        let view = LodView {
            distance: self.controller.distance(),
            camera_dir: camera.position.normalize(),
            rotation: self.controller.rotation(),
            opacity: ModeStyle::of(self.manager.mode()).label_opacity,
        };
        let projector = CameraProjector {
            camera: &camera,
            viewport: &viewport,
        };
        let enabled = self.layers.is_enabled(LayerId::Cities);
        self.label_pass = run_label_pass(
            self.manager.world_mut(),
            self.layers.cities.labels(),
            enabled,
            &view,
            &projector,
            &self.config.lod,
        );
        self.metrics
            .set_gauge(LABELS_VISIBLE, self.label_pass.sprites.len() as i64);
    }

    fn handle_click(&mut self, x: f64, y: f64) -> InputResponse {
        if let Some(label) = self.label_at(x, y) {
            let city = label.city.clone();
            self.metrics.inc(CITY_CLICKS);
            self.emit(GlobeEvent::CityClicked {
                name: city.name.clone(),
            });
            if let Some(callback) = self.on_city_click.as_mut() {
                callback(&city);
            }
            return InputResponse::CitySelected(city.name);
        }

        if !self.controller.click_allowed() {
            let velocity = self.controller.state().velocity;
            debug!(?velocity, "click swallowed while the globe is still moving");
            self.metrics.inc(CLICKS_SWALLOWED);
            self.emit(GlobeEvent::ClickSwallowed);
            return InputResponse::ClickSwallowed;
        }
        if !self.layers.is_enabled(LayerId::Pins) {
            return InputResponse::NoHit;
        }

        let Some(beacon) = self.pick_beacon(x, y) else {
            return InputResponse::NoHit;
        };
        self.metrics.inc(BEACON_CLICKS);
        self.emit(GlobeEvent::BeaconClicked {
            id: beacon.id.clone(),
        });
        if let Some(callback) = self.on_beacon_click.as_mut() {
            callback(&beacon);
        }
        InputResponse::BeaconSelected(beacon.id)
    }

    /// Nearest pin part under the pointer, resolved to its beacon record.
    /// Rays are taken into the globe frame; anything behind the globe body
    /// is ignored.
    fn pick_beacon(&self, x: f64, y: f64) -> Option<Beacon> {
        let to_globe = self.controller.rotation().transpose();
        let opts = PickOptions {
            root: Some(self.layers.pins.group()),
            occluder: Some(self.manager.globe_bounds()),
            ..PickOptions::default()
        };
        let world = self.manager.world();
        let hit = pick_screen(
            world,
            x,
            y,
            |x, y| {
                let ray = self.manager.ray_at(x, y)?;
                Some(Ray::new(to_globe.transform(ray.origin), to_globe.transform(ray.dir)))
            },
            opts,
        )?;
        let id = world.tag(hit.entity)?.as_str();
        self.beacons.iter().find(|b| b.id == id).cloned()
    }
}

impl Drop for GlobeEngine {
    fn drop(&mut self) {
        self.destroy();
    }
}
