use layers::data::{GlobeMode, LayerToggles};
use layers::layer::LayerId;

/// What the engine did, in order. Hosts drain these for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobeEvent {
    Created { width: f64, height: f64 },
    LayerRebuilt { layer: LayerId, objects: usize },
    TogglesApplied(LayerToggles),
    ModeChanged(GlobeMode),
    ImageryRequested { url: String },
    ImageryBound { url: String },
    ImageryFallback { url: String, reason: String },
    BeaconClicked { id: String },
    CityClicked { name: String },
    ClickSwallowed,
    Resized { width: f64, height: f64 },
    ResizeSkipped,
    Destroyed,
}

pub const FRAMES_RENDERED: &str = "frames_rendered";
pub const REBUILDS_PINS: &str = "rebuilds_pins";
pub const REBUILDS_HEAT: &str = "rebuilds_heat";
pub const REBUILDS_TRAILS: &str = "rebuilds_trails";
pub const REBUILDS_CITIES: &str = "rebuilds_cities";
pub const CLICKS_SWALLOWED: &str = "clicks_swallowed";
pub const BEACON_CLICKS: &str = "beacon_clicks";
pub const CITY_CLICKS: &str = "city_clicks";
pub const IMAGERY_BOUND: &str = "imagery_bound";
pub const IMAGERY_FALLBACKS: &str = "imagery_fallbacks";
pub const RESIZES_SKIPPED: &str = "resizes_skipped";

/// Gauge: labels shown by the last LOD pass.
pub const LABELS_VISIBLE: &str = "labels_visible";

pub(crate) fn rebuild_metric(layer: LayerId) -> &'static str {
    match layer {
        LayerId::Pins => REBUILDS_PINS,
        LayerId::Heat => REBUILDS_HEAT,
        LayerId::Trails => REBUILDS_TRAILS,
        LayerId::Cities => REBUILDS_CITIES,
    }
}
