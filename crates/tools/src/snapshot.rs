use std::fs;
use std::path::Path;

use globe::GlobeConfig;
use layers::data::{Beacon, City, GlobeMode, LayerToggles};
use serde::Deserialize;

/// Data/control state fed to the simulated globe, read from JSON.
///
/// ```json
/// { "beacons": [{ "id": "a", "lat": 51.5, "lng": -0.12, "intensity": 0.9 }],
///   "layers": { "trails": true }, "mode": "satellite" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub beacons: Vec<Beacon>,
    /// Omitted means the built-in city list.
    pub cities: Option<Vec<City>>,
    pub layers: LayerToggles,
    pub mode: GlobeMode,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    serde_json::from_str(&text).map_err(|e| format!("parse {path:?}: {e}"))
}

pub fn load_config(path: &Path) -> Result<GlobeConfig, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let config: GlobeConfig =
        serde_json::from_str(&text).map_err(|e| format!("parse {path:?}: {e}"))?;
    config.validate().map_err(|e| format!("{path:?}: {e}"))?;
    Ok(config)
}

/// Parses `WxH`, e.g. `1280x720`.
pub fn parse_size(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("size must look like WxH, got {s:?}"))?;
    Ok((parse_number(w)?, parse_number(h)?))
}

/// Parses `a,b`, e.g. `120,-40`.
pub fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got {s:?}"))?;
    Ok((parse_number(a)?, parse_number(b)?))
}

fn parse_number(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid number {s:?}: {e}"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("number must be finite, got {s:?}"))
    }
}
