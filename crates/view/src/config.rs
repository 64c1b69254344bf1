use foundation::{CameraState, LatLon};
use layers::LodLevel;
use poi::PoiFilter;
use serde::{Deserialize, Serialize};

/// Placeholder shipped in page templates in place of a real token.
pub const TOKEN_PLACEHOLDER: &str = "YOUR_MAPBOX_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialView {
    pub center: LatLon,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            center: LatLon::new(47.69, 13.38),
            zoom: 7.0,
            min_zoom: 3.0,
            max_zoom: 19.0,
        }
    }
}

impl InitialView {
    pub fn camera(&self) -> CameraState {
        CameraState::flat(self.center, self.zoom)
    }
}

/// Tunables of the view core. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub access_token: Option<String>,
    pub min_extrusion_zoom: f64,
    pub extrusion_pitch_deg: f64,
    pub zoom_debounce_ms: u64,
    pub basemap_settle_ms: u64,
    pub compass_poll_ms: u64,
    pub reset_north_duration_ms: u64,
    pub reset_north_pitch_deg: f64,
    pub key_step_deg: f64,
    pub drag_bearing_deg_per_px: f64,
    pub drag_pitch_deg_per_px: f64,
    pub lod_storage_key: String,
    pub default_lod: LodLevel,
    pub initial_view: InitialView,
    pub poi_filter: PoiFilter,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            min_extrusion_zoom: 15.0,
            extrusion_pitch_deg: 60.0,
            zoom_debounce_ms: 50,
            basemap_settle_ms: 250,
            compass_poll_ms: 100,
            reset_north_duration_ms: 800,
            reset_north_pitch_deg: 60.0,
            key_step_deg: 5.0,
            drag_bearing_deg_per_px: 0.5,
            drag_pitch_deg_per_px: 0.25,
            lod_storage_key: "castlemap.lod_level".to_string(),
            default_lod: LodLevel::High,
            initial_view: InitialView::default(),
            poi_filter: PoiFilter::default(),
        }
    }
}

impl ViewConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// The configured token, unless it is empty or the template placeholder.
    pub fn usable_access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != TOKEN_PLACEHOLDER)
    }
}
