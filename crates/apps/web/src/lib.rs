//! Browser entry points for the castle map page.
//!
//! The page owns the mapbox-gl maps and the DOM. It hands each map to
//! [`attach_basemap`], forwards map events (`styledata`, `zoomend`, input) to
//! the matching export, calls [`tick`] from a timer, and applies whatever
//! [`drain_events`] returns to the UI.

use std::cell::RefCell;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use foundation::{BasemapId, Millis};
use gloo_net::http::Request;
use layers::LodLevel;
use poi::{PoiFilter, parse_pois};
use prefs::{InMemoryPrefsStore, LocalStoragePrefsStore, PrefsStore};
use runtime::Stamped;
use serde_json::{Value, json};
use view::registry::BasemapRegistry;
use view::{ArrowKey, Modifiers, Phase, TransitionOutcome, ViewConfig, ViewEvent, ViewMode, ViewState};
use wasm_bindgen::prelude::*;

mod console_log;
mod js_backend;

use js_backend::JsBackend;

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

const PREFS_PREFIX: &str = "castlemap";

thread_local! {
    static STATE: RefCell<Option<ViewState>> = const { RefCell::new(None) };
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Run `f` against the view state.
///
/// A map call made from inside `f` can fire a synchronous map event that
/// re-enters an export; that call is rejected instead of panicking.
fn with_view<F, R>(f: F) -> Result<R, JsValue>
where
    F: FnOnce(&mut ViewState) -> Result<R, JsValue>,
{
    STATE.with(|cell| {
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("view state is busy"))?;
        let view = guard
            .as_mut()
            .ok_or_else(|| JsValue::from_str("init() has not been called"))?;
        f(view)
    })
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

fn open_prefs() -> Box<dyn PrefsStore> {
    match LocalStoragePrefsStore::new(PREFS_PREFIX) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "localStorage unavailable; preferences will not persist");
            Box::new(InMemoryPrefsStore::new())
        }
    }
}

fn outcome_str(outcome: TransitionOutcome) -> Result<String, JsValue> {
    match outcome {
        TransitionOutcome::Completed => Ok("completed".to_string()),
        TransitionOutcome::Pending => Ok("pending".to_string()),
        TransitionOutcome::NoOp => Ok("noop".to_string()),
        TransitionOutcome::Failed(e) => Err(js_err(e)),
    }
}

fn mode_str(mode: ViewMode) -> &'static str {
    match mode {
        ViewMode::TwoD => "2d",
        ViewMode::ThreeD => "3d",
    }
}

fn phase_str(phase: Phase) -> &'static str {
    match phase {
        Phase::Disabled => "disabled",
        Phase::Enabling => "enabling",
        Phase::Enabled => "enabled",
        Phase::Disabling => "disabling",
    }
}

fn event_json(view: &ViewState, stamped: &Stamped<ViewEvent>) -> Value {
    let name_of = |id: BasemapId| {
        view.registry()
            .get(id)
            .map(|h| h.name().to_string())
            .unwrap_or_else(|| id.to_string())
    };
    let body = match &stamped.event {
        ViewEvent::ModeChanged(mode) => json!({"type": "mode_changed", "mode": mode_str(*mode)}),
        ViewEvent::Alert(message) => json!({"type": "alert", "message": message}),
        ViewEvent::ToggleReverted { enabled } => json!({"type": "toggle_reverted", "enabled": enabled}),
        ViewEvent::PoisChanged {
            markers_visible,
            labels_visible,
        } => json!({
            "type": "pois_changed",
            "markers_visible": markers_visible,
            "labels_visible": labels_visible,
        }),
        ViewEvent::CompassShown => json!({"type": "compass_shown"}),
        ViewEvent::CompassHidden => json!({"type": "compass_hidden"}),
        ViewEvent::CompassRotated { arrow_deg } => json!({"type": "compass_rotated", "arrow_deg": arrow_deg}),
        ViewEvent::NavigationAttached => json!({"type": "navigation_attached"}),
        ViewEvent::NavigationDetached => json!({"type": "navigation_detached"}),
        ViewEvent::LodApplied {
            basemap,
            level,
            written,
            failed,
        } => json!({
            "type": "lod_applied",
            "basemap": name_of(*basemap),
            "level": level.index(),
            "written": written,
            "failed": failed,
        }),
        ViewEvent::LodDeferred { basemap, level } => json!({
            "type": "lod_deferred",
            "basemap": name_of(*basemap),
            "level": level.index(),
        }),
    };
    json!({"at": stamped.at.0, "event": body})
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    console_log::init(tracing::Level::INFO);
    Ok(())
}

/// Create the view core. `config_json` may be omitted or partial; missing
/// fields take their defaults.
#[wasm_bindgen]
pub fn init(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json.as_deref().map(str::trim) {
        Some(json) if !json.is_empty() => ViewConfig::from_json(json).map_err(js_err)?,
        _ => ViewConfig::default(),
    };
    if config.usable_access_token().is_none() {
        tracing::warn!("no access token configured; the 3D view will be unavailable");
    }
    let view = ViewState::new(config, BasemapRegistry::with_default_catalogue(), open_prefs());
    tracing::info!(lod = %view.lod_level(), "view core initialised");
    STATE.with(|cell| {
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("view state is busy"))?;
        *guard = Some(view);
        Ok(())
    })
}

/// Basemap catalogue as JSON: `[{name, style_url, extrusion, rotation}]`.
#[wasm_bindgen]
pub fn basemap_catalogue() -> Result<String, JsValue> {
    with_view(|view| {
        let list: Vec<Value> = view
            .registry()
            .iter()
            .map(|h| {
                json!({
                    "name": h.name(),
                    "style_url": h.spec().style_url,
                    "extrusion": h.capabilities().extrusion,
                    "rotation": h.capabilities().rotation,
                })
            })
            .collect();
        Ok(Value::Array(list).to_string())
    })
}

#[wasm_bindgen]
pub fn basemap_style_url(name: &str, maptiler_key: &str, jawg_token: &str) -> Result<String, JsValue> {
    with_view(|view| {
        let id = view
            .registry()
            .id_of(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown basemap `{name}`")))?;
        let handle = view
            .registry()
            .get(id)
            .ok_or_else(|| JsValue::from_str(&format!("unknown basemap `{name}`")))?;
        Ok(handle
            .spec()
            .resolve_style_url(&[("maptiler_key", maptiler_key), ("jawg_token", jawg_token)]))
    })
}

/// Initial camera and zoom bounds for constructing the maps.
#[wasm_bindgen]
pub fn initial_view() -> Result<String, JsValue> {
    with_view(|view| serde_json::to_string(&view.config().initial_view).map_err(js_err))
}

#[wasm_bindgen]
pub fn access_token() -> Result<Option<String>, JsValue> {
    with_view(|view| Ok(view.config().usable_access_token().map(str::to_string)))
}

#[wasm_bindgen]
pub fn attach_basemap(name: &str, map: JsValue) -> Result<(), JsValue> {
    let backend = JsBackend::new(map)?;
    with_view(|view| view.attach_backend(name, Box::new(backend)).map_err(js_err))
}

#[wasm_bindgen]
pub fn detach_basemap(name: &str) -> Result<(), JsValue> {
    with_view(|view| view.detach_backend(name).map(|_| ()).map_err(js_err))
}

/// The map started loading a new style (`setStyle` or first load).
#[wasm_bindgen]
pub fn style_loading(name: &str) -> Result<(), JsValue> {
    with_view(|view| {
        view.on_style_loading(name);
        Ok(())
    })
}

/// The map's style finished loading. Returns how many parked operations ran.
#[wasm_bindgen]
pub fn style_ready(name: &str) -> Result<u32, JsValue> {
    with_view(|view| Ok(view.on_style_ready(name) as u32))
}

/// Turn on the 3D view, optionally on a specific basemap.
///
/// Resolves to `"completed"`, `"pending"` or `"noop"`; a rejection carries
/// the user-facing reason (also queued as an `alert` event).
#[wasm_bindgen]
pub fn enable_3d(basemap: Option<String>) -> Result<String, JsValue> {
    with_view(|view| outcome_str(view.enable(basemap.as_deref())))
}

#[wasm_bindgen]
pub fn disable_3d() -> Result<String, JsValue> {
    with_view(|view| outcome_str(view.disable()))
}

#[wasm_bindgen]
pub fn basemap_changed(name: &str) -> Result<String, JsValue> {
    with_view(|view| outcome_str(view.handle_basemap_change(name)))
}

#[wasm_bindgen]
pub fn set_lod_level(level: u8) -> Result<(), JsValue> {
    let level = LodLevel::from_index(level)
        .ok_or_else(|| JsValue::from_str(&format!("detail level must be 0..=2, got {level}")))?;
    with_view(|view| {
        view.set_lod_level(level);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn lod_level() -> Result<u8, JsValue> {
    with_view(|view| Ok(view.lod_level().index()))
}

#[wasm_bindgen]
pub fn set_labels_enabled(enabled: bool) -> Result<(), JsValue> {
    with_view(|view| {
        view.set_labels_enabled(enabled);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn zoom_ended() -> Result<(), JsValue> {
    with_view(|view| {
        view.on_zoom_end();
        Ok(())
    })
}

/// Advance the view clock to `now_ms` (e.g. `performance.now()`).
#[wasm_bindgen]
pub fn tick(now_ms: f64) -> Result<(), JsValue> {
    let now = Millis(now_ms.max(0.0) as u64);
    with_view(|view| {
        view.tick(now);
        Ok(())
    })
}

/// When the next timer is due, if any; lets the page sleep until then.
#[wasm_bindgen]
pub fn next_due() -> Result<Option<f64>, JsValue> {
    with_view(|view| Ok(view.next_due().map(|m| m.0 as f64)))
}

#[wasm_bindgen]
pub fn reset_north() -> Result<(), JsValue> {
    with_view(|view| view.reset_north().map_err(js_err))
}

/// PNG data URL of the active map's canvas.
#[wasm_bindgen]
pub fn capture_map() -> Result<String, JsValue> {
    with_view(|view| view.capture_active_canvas().map_err(js_err))
}

fn filter() -> Result<PoiFilter, JsValue> {
    with_view(|view| Ok(view.config().poi_filter.clone()))
}

fn install_pois(text: &str, filter: &PoiFilter) -> Result<u32, JsValue> {
    let load = parse_pois(text, filter).map_err(js_err)?;
    tracing::info!(
        kept = load.records.len(),
        total = load.total_features,
        filtered = load.filtered_out,
        skipped_geometry = load.skipped_geometry,
        "POI collection parsed"
    );
    let count = load.records.len() as u32;
    with_view(|view| {
        view.load_pois(load.records);
        Ok(count)
    })
}

/// Load POIs from an already fetched GeoJSON string.
#[wasm_bindgen]
pub fn load_pois(geojson: &str) -> Result<u32, JsValue> {
    install_pois(geojson, &filter()?)
}

#[wasm_bindgen]
pub async fn load_pois_from(url: String) -> Result<u32, JsValue> {
    let filter = filter()?;
    let resp = Request::get(&url).send().await.map_err(js_err)?;
    if !resp.ok() {
        let status = resp.status();
        return Err(JsValue::from_str(&format!("HTTP {status} fetching {url}")));
    }
    let text = resp.text().await.map_err(js_err)?;
    install_pois(&text, &filter)
}

/// Marker list with per-marker visibility, as JSON.
#[wasm_bindgen]
pub fn pois_json() -> Result<String, JsValue> {
    with_view(|view| {
        let list: Vec<Value> = view
            .pois()
            .iter()
            .map(|m| {
                json!({
                    "lat": m.record.position.lat_deg,
                    "lon": m.record.position.lon_deg,
                    "title": m.record.title,
                    "description": m.record.description,
                    "image": m.record.image,
                    "marker_visible": m.marker_visible(),
                    "label_visible": m.label_visible(),
                })
            })
            .collect();
        Ok(Value::Array(list).to_string())
    })
}

/// Snapshot of mode, detail level, compass and navigation state.
#[wasm_bindgen]
pub fn view_status() -> Result<String, JsValue> {
    with_view(|view| {
        Ok(json!({
            "mode": mode_str(view.mode()),
            "phase": phase_str(view.phase()),
            "active": view.active_basemap().map(|h| h.name()),
            "lod_level": view.lod_level().index(),
            "compass_visible": view.compass().is_visible(),
            "compass_arrow_deg": view.compass().arrow_deg(),
            "navigation_attached": view.navigation().is_attached(),
            "markers_visible": view.pois().markers_shown(),
            "labels_visible": view.pois().labels_shown(),
        })
        .to_string())
    })
}

/// Events queued since the last call, as a JSON array.
#[wasm_bindgen]
pub fn drain_events() -> Result<String, JsValue> {
    with_view(|view| {
        let events = view.drain_events();
        let list: Vec<Value> = events.iter().map(|e| event_json(view, e)).collect();
        Ok(Value::Array(list).to_string())
    })
}

/// `keydown` on the map container. `true` means the page should call
/// `preventDefault`.
#[wasm_bindgen]
pub fn key_down(key: &str, shift: bool, alt: bool) -> Result<bool, JsValue> {
    let Some(key) = ArrowKey::from_key(key) else {
        return Ok(false);
    };
    with_view(|view| Ok(view.on_key(key, Modifiers { shift, alt })))
}

/// `pointerdown` on the map canvas. `true` means the page should capture
/// the pointer and stop propagation to the map's own pan handler.
#[wasm_bindgen]
pub fn pointer_down(pointer_id: i32, x: f64, y: f64, shift: bool, alt: bool) -> Result<bool, JsValue> {
    with_view(|view| Ok(view.on_pointer_down(pointer_id, x, y, Modifiers { shift, alt })))
}

#[wasm_bindgen]
pub fn pointer_move(pointer_id: i32, x: f64, y: f64) -> Result<bool, JsValue> {
    with_view(|view| Ok(view.on_pointer_move(pointer_id, x, y)))
}

/// `true` means the page should release the pointer capture.
#[wasm_bindgen]
pub fn pointer_up(pointer_id: i32) -> Result<bool, JsValue> {
    with_view(|view| Ok(view.on_pointer_up(pointer_id)))
}
