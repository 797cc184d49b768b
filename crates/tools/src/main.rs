use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use globe::{
    FileTextureSource, GlobeConfig, GlobeEngine, GlobeOptions, HeadlessHost, InputEvent,
    InputResponse, Platform,
};
use gpu::renderer::{RecordingOverlay, RecordingSurface, RenderLog};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod snapshot;

use snapshot::{Snapshot, load_config, load_snapshot, parse_pair, parse_size};

/// Pointer moves used to play back a drag.
const DRAG_STEPS: usize = 8;
const FRAME_DT_S: f64 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drive a headless globe and print what it did")]
struct Args {
    /// Data snapshot (JSON: beacons, cities, layers, mode)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Globe configuration (JSON); missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to run after the input has been played back
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Container size in CSS pixels, WxH
    #[arg(long, default_value = "800x600")]
    size: String,

    /// Device pixel ratio reported by the host
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,

    /// Drag from the container centre by dx,dy pixels
    #[arg(long, allow_hyphen_values = true)]
    drag: Option<String>,

    /// Wheel steps; negative zooms in
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    wheel: i32,

    /// Click at x,y once the frames have run
    #[arg(long)]
    click: Option<String>,

    /// Equirectangular surface image (PNG or JPEG) loaded from disk
    #[arg(long)]
    texture: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let (width, height) = parse_size(&args.size)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GlobeConfig::default(),
    };
    let snapshot = match &args.snapshot {
        Some(path) => load_snapshot(path)?,
        None => Snapshot::default(),
    };

    let mut options = GlobeOptions::default()
        .with_config(config)
        .with_layers(snapshot.layers)
        .with_beacons(snapshot.beacons)
        .with_mode(snapshot.mode);
    if let Some(cities) = snapshot.cities {
        options = options.with_cities(cities);
    }
    if let Some(texture) = &args.texture {
        // A local file the user named on the command line counts as consent.
        options = options.with_imagery(texture.to_string_lossy(), true);
    }

    let clicked: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let on_beacon = clicked.clone();
    options = options.on_beacon_click(move |beacon| {
        *on_beacon.borrow_mut() = Some(beacon.id.clone());
    });

    let log: RenderLog = Rc::new(RefCell::new(Vec::new()));
    let platform = Platform {
        host: Box::new(HeadlessHost::new(width, height, args.pixel_ratio)),
        surface: Box::new(RecordingSurface::new(log.clone())),
        overlay: Box::new(RecordingOverlay::new(log.clone())),
        textures: Box::new(FileTextureSource::new()),
    };
    let mut engine = GlobeEngine::create(options, platform).map_err(|e| e.to_string())?;
    info!(width, height, "simulated globe created");

    // One frame so imagery and labels settle before any input.
    engine.tick(FRAME_DT_S);

    if let Some(drag) = &args.drag {
        let (dx, dy) = parse_pair(drag)?;
        play_drag(&mut engine, [width / 2.0, height / 2.0], [dx, dy]);
    }
    for _ in 0..args.wheel.unsigned_abs() {
        let delta_y = if args.wheel < 0 { -1.0 } else { 1.0 };
        engine.handle_input(InputEvent::Wheel { delta_y });
        engine.tick(FRAME_DT_S);
    }
    for _ in 0..args.frames {
        engine.tick(FRAME_DT_S);
    }

    let click = match &args.click {
        Some(point) => {
            let (x, y) = parse_pair(point)?;
            let response = engine.handle_input(InputEvent::Click { x, y });
            debug!(?response, x, y, "click played back");
            Some(describe(&response))
        }
        None => None,
    };

    let state = engine.camera_state();
    let metrics = engine.metrics_snapshot();
    let counts = engine.rebuild_counts();
    let report = json!({
        "frames_rendered": engine.scene().frames_rendered(),
        "render_calls": log.borrow().len(),
        "camera": {
            "distance": state.distance,
            "yaw": state.yaw,
            "pitch": state.pitch,
            "velocity": state.velocity,
            "dragging": state.dragging,
        },
        "visible_labels": engine
            .visible_labels()
            .iter()
            .map(|l| l.text.clone())
            .collect::<Vec<_>>(),
        "pins": engine.layers().pins.pin_count(),
        "trails": engine.layers().trails.arcs(),
        "rebuilds": {
            "pins": counts.pins,
            "heat": counts.heat,
            "trails": counts.trails,
            "cities": counts.cities,
        },
        "click": click,
        "hit_beacon": clicked.borrow().clone(),
        "counters": metrics
            .counters
            .iter()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect::<serde_json::Map<_, _>>(),
        "gauges": metrics
            .gauges
            .iter()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect::<serde_json::Map<_, _>>(),
    });

    engine.destroy();
    let payload = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn play_drag(engine: &mut GlobeEngine, from: [f64; 2], delta: [f64; 2]) {
    engine.handle_input(InputEvent::PointerDown {
        x: from[0],
        y: from[1],
    });
    for step in 1..=DRAG_STEPS {
        let t = step as f64 / DRAG_STEPS as f64;
        engine.handle_input(InputEvent::PointerMove {
            x: from[0] + delta[0] * t,
            y: from[1] + delta[1] * t,
        });
        engine.tick(FRAME_DT_S);
    }
    engine.handle_input(InputEvent::PointerUp);
}

fn describe(response: &InputResponse) -> String {
    match response {
        InputResponse::BeaconSelected(id) => format!("beacon:{id}"),
        InputResponse::CitySelected(name) => format!("city:{name}"),
        InputResponse::ClickSwallowed => "swallowed".to_string(),
        InputResponse::NoHit => "miss".to_string(),
        InputResponse::Handled => "handled".to_string(),
        InputResponse::Ignored => "ignored".to_string(),
    }
}
