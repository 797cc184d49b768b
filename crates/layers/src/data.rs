//! Records supplied by the host on every update.
//!
//! The wire shape (JSON) uses flat `lat`/`lng` fields, `city` for the city
//! name and `ts` (milliseconds) for the timestamp.

use std::collections::HashSet;

use foundation::math::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lower bound applied to every intensity before use.
pub const MIN_INTENSITY: f64 = 0.05;
/// Intensity above which a beacon is drawn as hot.
pub const HOT_INTENSITY: f64 = 0.75;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconKind {
    Drop,
    Event,
    Product,
    Sponsor,
    Checkin,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BeaconRecord", into = "BeaconRecord")]
pub struct Beacon {
    pub id: String,
    pub title: String,
    pub kind: BeaconKind,
    pub position: GeoPoint,
    pub city_name: Option<String>,
    pub sponsored: bool,
    /// Raw source value; read through [`Beacon::intensity_or`].
    pub intensity: Option<f64>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
}

impl Beacon {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            kind: BeaconKind::Other,
            position: GeoPoint::new(latitude, longitude),
            city_name: None,
            sponsored: false,
            intensity: None,
            timestamp: None,
        }
    }

    pub fn with_kind(mut self, kind: BeaconKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_timestamp(mut self, ts_ms: i64) -> Self {
        self.timestamp = Some(ts_ms);
        self
    }

    pub fn with_sponsored(mut self, sponsored: bool) -> Self {
        self.sponsored = sponsored;
        self
    }

    /// Source intensity clamped to `[MIN_INTENSITY, 1]`; missing or NaN
    /// values use `default` (also clamped).
    pub fn intensity_or(&self, default: f64) -> f64 {
        let raw = match self.intensity {
            Some(v) if v.is_finite() => v,
            _ => default,
        };
        raw.clamp(MIN_INTENSITY, 1.0)
    }

    /// Hot beacons get the emissive pin: high intensity, or an event/drop.
    pub fn is_hot(&self, default_intensity: f64) -> bool {
        self.intensity_or(default_intensity) > HOT_INTENSITY
            || matches!(self.kind, BeaconKind::Event | BeaconKind::Drop)
    }

    /// Sort key for recency ordering; missing timestamps sort oldest.
    pub fn recency_key(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BeaconRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    kind: BeaconKind,
    lat: f64,
    lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default)]
    sponsored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intensity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

impl From<BeaconRecord> for Beacon {
    fn from(r: BeaconRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            kind: r.kind,
            position: GeoPoint::new(r.lat, r.lng),
            city_name: r.city,
            sponsored: r.sponsored,
            intensity: r.intensity,
            timestamp: r.ts,
        }
    }
}

impl From<Beacon> for BeaconRecord {
    fn from(b: Beacon) -> Self {
        Self {
            id: b.id,
            title: b.title,
            kind: b.kind,
            lat: b.position.latitude,
            lng: b.position.longitude,
            city: b.city_name,
            sponsored: b.sponsored,
            intensity: b.intensity,
            ts: b.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CityRecord", into = "CityRecord")]
pub struct City {
    pub name: String,
    pub position: GeoPoint,
    /// 1 (major) to 3 (minor); out-of-range values are clamped on read.
    pub tier: u8,
    pub active: bool,
    pub sponsored: bool,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, tier: u8) -> Self {
        Self {
            name: name.into(),
            position: GeoPoint::new(latitude, longitude),
            tier,
            active: false,
            sponsored: false,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn tier(&self) -> u8 {
        self.tier.clamp(1, 3)
    }

    /// Built-in reference cities shown when the host supplies none.
    pub fn defaults() -> Vec<City> {
        DEFAULT_CITIES
            .iter()
            .map(|&(name, lat, lng, tier)| City::new(name, lat, lng, tier).with_active(name == "LONDON"))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CityRecord {
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default = "default_tier")]
    tier: u8,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    sponsored: bool,
}

fn default_tier() -> u8 {
    3
}

impl From<CityRecord> for City {
    fn from(r: CityRecord) -> Self {
        Self {
            name: r.name,
            position: GeoPoint::new(r.lat, r.lng),
            tier: r.tier,
            active: r.active,
            sponsored: r.sponsored,
        }
    }
}

impl From<City> for CityRecord {
    fn from(c: City) -> Self {
        Self {
            name: c.name,
            lat: c.position.latitude,
            lng: c.position.longitude,
            tier: c.tier,
            active: c.active,
            sponsored: c.sponsored,
        }
    }
}

#[rustfmt::skip]
const DEFAULT_CITIES: &[(&str, f64, f64, u8)] = &[
    ("LONDON", 51.5074, -0.1278, 1),
    ("BERLIN", 52.52, 13.405, 1),
    ("PARIS", 48.8566, 2.3522, 1),
    ("AMSTERDAM", 52.3676, 4.9041, 1),
    ("MADRID", 40.4168, -3.7038, 1),
    ("ROME", 41.9028, 12.4964, 1),
    ("NEW YORK", 40.7128, -74.006, 1),
    ("LOS ANGELES", 34.0522, -118.2437, 1),
    ("MIAMI", 25.7617, -80.1918, 1),
    ("TORONTO", 43.6532, -79.3832, 1),
    ("SÃO PAULO", -23.5505, -46.6333, 1),
    ("CAPE TOWN", -33.9249, 18.4241, 1),
    ("DUBAI", 25.2048, 55.2708, 1),
    ("TEL AVIV", 32.0853, 34.7818, 1),
    ("TOKYO", 35.6762, 139.6503, 1),
    ("SEOUL", 37.5665, 126.978, 1),
    ("HONG KONG", 22.3193, 114.1694, 1),
    ("BANGKOK", 13.7563, 100.5018, 1),
    ("SINGAPORE", 1.3521, 103.8198, 1),
    ("SYDNEY", -33.8688, 151.2093, 1),
    ("MANCHESTER", 53.4808, -2.2426, 2),
    ("GLASGOW", 55.8642, -4.2518, 2),
    ("DUBLIN", 53.3498, -6.2603, 2),
    ("COPENHAGEN", 55.6761, 12.5683, 2),
    ("STOCKHOLM", 59.3293, 18.0686, 2),
    ("VIENNA", 48.2082, 16.3738, 2),
    ("PRAGUE", 50.0755, 14.4378, 2),
    ("WARSAW", 52.2297, 21.0122, 2),
    ("ATHENS", 37.9838, 23.7275, 2),
    ("ISTANBUL", 41.0082, 28.9784, 2),
    ("SAN FRANCISCO", 37.7749, -122.4194, 2),
    ("LAS VEGAS", 36.1699, -115.1398, 2),
    ("WASHINGTON DC", 38.9072, -77.0369, 2),
    ("ATLANTA", 33.749, -84.388, 2),
    ("VANCOUVER", 49.2827, -123.1207, 2),
    ("BOGOTÁ", 4.711, -74.0721, 2),
    ("SANTIAGO", -33.4489, -70.6693, 2),
    ("LIMA", -12.0464, -77.0428, 2),
    ("BEIJING", 39.9042, 116.4074, 2),
    ("SHANGHAI", 31.2304, 121.4737, 2),
    ("TAIPEI", 25.033, 121.5654, 2),
    ("MANILA", 14.5995, 120.9842, 2),
    ("KUALA LUMPUR", 3.139, 101.6869, 2),
    ("JAKARTA", -6.2088, 106.8456, 2),
    ("MUMBAI", 19.076, 72.8777, 2),
    ("DELHI", 28.6139, 77.209, 2),
    ("BRISBANE", -27.4698, 153.0251, 2),
    ("AUCKLAND", -36.8485, 174.7633, 2),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToggles {
    pub pins: bool,
    pub heat: bool,
    pub trails: bool,
    pub cities: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            pins: true,
            heat: false,
            trails: false,
            cities: true,
        }
    }
}

/// Surface look of the globe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobeMode {
    /// Deep-ocean tint, brighter grid and labels.
    #[default]
    Night,
    /// Imagery-forward tint, subdued grid and labels.
    Satellite,
}

/// Drops records with unusable coordinates, clamps/wraps the rest and keeps
/// only the last record for each id (at that record's position in the list).
pub fn resolve_beacons(beacons: &[Beacon]) -> Vec<Beacon> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out: Vec<Beacon> = Vec::with_capacity(beacons.len());
    for b in beacons.iter().rev() {
        let Some(position) = b.position.sanitized() else {
            debug!(id = %b.id, "skipping beacon with non-finite coordinates");
            continue;
        };
        if !seen.insert(b.id.as_str()) {
            continue;
        }
        out.push(Beacon {
            position,
            ..b.clone()
        });
    }
    out.reverse();
    out
}

/// Drops cities with unusable coordinates and clamps/wraps the rest.
pub fn resolve_cities(cities: &[City]) -> Vec<City> {
    cities
        .iter()
        .filter_map(|c| match c.position.sanitized() {
            Some(position) => Some(City {
                position,
                ..c.clone()
            }),
            None => {
                debug!(name = %c.name, "skipping city with non-finite coordinates");
                None
            }
        })
        .collect()
}
