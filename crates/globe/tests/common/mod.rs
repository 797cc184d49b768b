#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use globe::{GlobeConfig, GlobeEngine, GlobeOptions, HeadlessHost, ManualTextureSource, Platform};
use gpu::renderer::{RecordingOverlay, RecordingSurface, RenderEvent, RenderLog};
use image::{ImageFormat, Rgba, RgbaImage};

pub const WIDTH: f64 = 800.0;
pub const HEIGHT: f64 = 600.0;

/// A globe on headless platform doubles, plus handles on each double.
pub struct Harness {
    pub engine: GlobeEngine,
    pub host: HeadlessHost,
    pub log: RenderLog,
    pub textures: ManualTextureSource,
}

impl Harness {
    pub fn new(options: GlobeOptions) -> Self {
        let host = HeadlessHost::new(WIDTH, HEIGHT, 1.0);
        let log: RenderLog = Rc::new(RefCell::new(Vec::new()));
        let textures = ManualTextureSource::new();
        let platform = Platform {
            host: Box::new(host.clone()),
            surface: Box::new(RecordingSurface::new(log.clone())),
            overlay: Box::new(RecordingOverlay::new(log.clone())),
            textures: Box::new(textures.clone()),
        };
        let engine = GlobeEngine::create(options.with_config(small_config()), platform)
            .expect("valid options");
        Self {
            engine,
            host,
            log,
            textures,
        }
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.engine.tick(1.0 / 60.0);
        }
    }

    pub fn scene_renders(&self) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|e| matches!(e, RenderEvent::Scene { .. }))
            .count()
    }

    pub fn log_len(&self) -> usize {
        self.log.borrow().len()
    }
}

/// Small textures keep the tests fast; everything else is the default.
pub fn small_config() -> GlobeConfig {
    let mut cfg = GlobeConfig::default();
    cfg.textures.surface_size = 64;
    cfg.textures.glow_size = 16;
    cfg.textures.seed = Some(42);
    cfg
}

pub fn png_bytes() -> Vec<u8> {
    let image = RgbaImage::from_pixel(8, 4, Rgba([20, 60, 120, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).expect("png encode");
    out.into_inner()
}

pub fn center() -> (f64, f64) {
    (WIDTH / 2.0, HEIGHT / 2.0)
}
