//! End-to-end behaviour of the view core against in-memory backends.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::{CameraState, LatLon, Millis};
use layers::extrusion::EXTRUSION_LAYER_ID;
use layers::{LodLevel, StyleDocument, Visibility, classify_style, parse_style_str};
use poi::PoiRecord;
use prefs::{InMemoryPrefsStore, PrefsError, PrefsStore};
use pretty_assertions::assert_eq;

use crate::backend::Interaction;
use crate::config::ViewConfig;
use crate::machine::{LodOutcome, Phase, TransitionOutcome, ViewEvent, ViewMode, ViewState};
use crate::memory::MemoryBackend;
use crate::navigation::{ArrowKey, Modifiers};
use crate::registry::{BasemapRegistry, BasemapSpec};

const EPS: f64 = 1e-9;

const STYLE: &str = r#"{
    "version": 8,
    "name": "fixture",
    "sources": {"composite": {"type": "vector"}},
    "layers": [
        {"id": "background", "type": "background"},
        {"id": "water", "type": "fill", "source": "composite", "source-layer": "water"},
        {"id": "building", "type": "fill", "source": "composite", "source-layer": "building"},
        {"id": "road-motorway", "type": "line", "source": "composite", "source-layer": "road"},
        {"id": "road-service", "type": "line", "source": "composite", "source-layer": "road"},
        {"id": "road-path", "type": "line", "source": "composite", "source-layer": "road"},
        {"id": "admin-0-boundary", "type": "line", "source": "composite", "source-layer": "admin"},
        {"id": "admin-1-boundary", "type": "line", "source": "composite", "source-layer": "admin"},
        {"id": "road-label", "type": "symbol", "source": "composite", "source-layer": "road",
         "layout": {"text-field": "{name}"}},
        {"id": "settlement-minor-label", "type": "symbol", "source": "composite",
         "source-layer": "place_label", "layout": {"text-field": "{name}"}},
        {"id": "country-label", "type": "symbol", "source": "composite",
         "source-layer": "place_label", "layout": {"text-field": "{name}"}}
    ]
}"#;

fn fixture_style() -> StyleDocument {
    parse_style_str(STYLE).unwrap()
}

/// Prefs store whose contents outlive the view state, to simulate reloads.
#[derive(Clone, Default)]
struct SharedPrefs(Rc<RefCell<InMemoryPrefsStore>>);

impl PrefsStore for SharedPrefs {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<bool, PrefsError> {
        self.0.borrow_mut().remove(key)
    }
}

struct Harness {
    state: ViewState,
    a: MemoryBackend,
    b: MemoryBackend,
    c: MemoryBackend,
    prefs: SharedPrefs,
    clock: u64,
}

impl Harness {
    fn new() -> Self {
        Self::with_prefs(SharedPrefs::default())
    }

    fn with_prefs(prefs: SharedPrefs) -> Self {
        let config = ViewConfig::default().with_access_token("pk.test");
        let registry = BasemapRegistry::new([
            BasemapSpec::new("A", "a.json"),
            BasemapSpec::new("B", "b.json"),
            BasemapSpec::new("C", "c.json"),
        ]);
        let mut state = ViewState::new(config, registry, Box::new(prefs.clone()));
        let start = CameraState::flat(LatLon::new(47.69, 13.38), 10.0);
        let a = MemoryBackend::new(fixture_style()).with_camera(start);
        let b = MemoryBackend::new(fixture_style()).with_camera(start);
        let c = MemoryBackend::new(fixture_style()).with_camera(start);
        state.attach_backend("A", Box::new(a.clone())).unwrap();
        state.attach_backend("B", Box::new(b.clone())).unwrap();
        state.attach_backend("C", Box::new(c.clone())).unwrap();
        state.load_pois(vec![
            PoiRecord {
                position: LatLon::new(48.21, 16.37),
                title: "Hofburg".to_string(),
                description: Some("Imperial palace".to_string()),
                image: Some("hofburg.jpg".to_string()),
            },
            PoiRecord {
                position: LatLon::new(47.80, 13.04),
                title: "Hohensalzburg".to_string(),
                description: Some("Fortress".to_string()),
                image: Some("hohensalzburg.jpg".to_string()),
            },
        ]);
        state.drain_events();
        Self {
            state,
            a,
            b,
            c,
            prefs,
            clock: 0,
        }
    }

    fn advance(&mut self, ms: u64) {
        self.clock += ms;
        self.state.tick(Millis(self.clock));
    }

    fn events(&mut self) -> Vec<ViewEvent> {
        self.state.drain_events().into_iter().map(|e| e.event).collect()
    }

    /// Start a swap to `name` whose style is still loading.
    fn begin_loading(&mut self, name: &str) {
        let backend = match name {
            "A" => &self.a,
            "B" => &self.b,
            _ => &self.c,
        };
        backend.replace_style(fixture_style());
        self.state.on_style_loading(name);
    }
}

fn visible(backend: &MemoryBackend, id: &str) -> bool {
    backend.visibility_of(id).is_some_and(Visibility::is_visible)
}

fn set_camera(backend: &MemoryBackend, camera: CameraState) {
    let mut handle = backend.clone();
    crate::backend::MapBackend::jump_to(&mut handle, &camera).unwrap();
}

#[test]
fn enable_raises_zoom_tilts_and_hides_markers() {
    let mut h = Harness::new();
    assert_eq!(h.state.enable(Some("A")), TransitionOutcome::Completed);

    let cam = h.a.current_camera();
    assert_eq!(cam.zoom, 15.0);
    assert_eq!(cam.pitch_deg(), 60.0);
    assert_eq!(cam.bearing_deg(), 0.0);
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 1);
    assert_eq!(h.state.pois().visible_marker_count(), 0);
    assert!(h.state.compass().is_visible());
    assert_eq!(h.state.phase(), Phase::Enabled);
    assert_eq!(h.a.interaction(Interaction::DragRotate), Some(true));
    assert_eq!(h.a.interaction(Interaction::DoubleClickZoom), Some(false));

    let events = h.events();
    assert!(events.contains(&ViewEvent::CompassShown));
    assert!(events.contains(&ViewEvent::NavigationAttached));
    assert!(events.contains(&ViewEvent::ModeChanged(ViewMode::ThreeD)));
    assert!(events.contains(&ViewEvent::PoisChanged {
        markers_visible: false,
        labels_visible: false
    }));
}

#[test]
fn enable_keeps_zoom_above_minimum() {
    let mut h = Harness::new();
    set_camera(&h.a, CameraState::flat(LatLon::new(47.0, 13.0), 17.5));
    h.state.enable(Some("A"));
    assert_eq!(h.a.current_camera().zoom, 17.5);
}

#[test]
fn disable_from_disabled_changes_nothing() {
    let mut h = Harness::new();
    let before = h.a.snapshot();
    let camera = h.a.current_camera();
    assert_eq!(h.state.disable(), TransitionOutcome::NoOp);
    assert_eq!(h.state.disable(), TransitionOutcome::NoOp);
    assert_eq!(h.a.snapshot(), before);
    assert_eq!(h.a.current_camera(), camera);
    assert_eq!(h.a.jump_count(), 0);
    assert_eq!(h.events(), vec![]);
    assert_eq!(h.state.mode(), ViewMode::TwoD);
}

#[test]
fn disable_cleans_every_basemap() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    h.state.handle_basemap_change("B");
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 1);
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 1);
    h.events();

    assert_eq!(h.state.disable(), TransitionOutcome::Completed);
    for backend in [&h.a, &h.b] {
        assert_eq!(backend.count_layers_of_type("fill-extrusion"), 0);
        let cam = backend.current_camera();
        assert_eq!(cam.pitch_deg(), 0.0);
        assert_eq!(cam.bearing_deg(), 0.0);
        assert_eq!(backend.interaction(Interaction::DragRotate), Some(false));
    }
    assert_eq!(h.state.pois().visible_marker_count(), 2);
    assert!(!h.state.compass().is_visible());
    assert!(!h.state.navigation().is_attached());

    let events = h.events();
    assert!(events.contains(&ViewEvent::NavigationDetached));
    assert!(events.contains(&ViewEvent::CompassHidden));
    assert!(events.contains(&ViewEvent::ModeChanged(ViewMode::TwoD)));
}

#[test]
fn disable_resynchronises_labels_with_setting() {
    let mut h = Harness::new();
    h.state.set_labels_enabled(false);
    h.state.enable(Some("A"));
    h.state.disable();
    assert_eq!(h.state.pois().visible_marker_count(), 2);
    assert_eq!(h.state.pois().visible_label_count(), 0);
}

#[test]
fn basemap_switch_preserves_camera_across_swaps() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));

    let on_a = CameraState::new(LatLon::new(48.2, 16.37), 16.0, 45.0, 70.0);
    set_camera(&h.a, on_a);
    h.begin_loading("B");
    assert_eq!(h.state.handle_basemap_change("B"), TransitionOutcome::Pending);
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 0);
    h.b.set_style_loaded(true);
    assert_eq!(h.state.on_style_ready("B"), 1);

    let on_b = h.b.current_camera();
    assert!(on_b.approx_eq(&on_a, EPS), "{on_b:?} != {on_a:?}");
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 1);
    assert_eq!(h.state.pois().visible_marker_count(), 0);
    assert_eq!(h.b.interaction(Interaction::DragRotate), Some(true));

    let moved = CameraState::new(LatLon::new(47.26, 11.39), 17.25, 300.0, 35.0);
    set_camera(&h.b, moved);
    h.begin_loading("C");
    h.state.handle_basemap_change("C");
    h.c.set_style_loaded(true);
    h.state.on_style_ready("C");
    assert!(h.c.current_camera().approx_eq(&moved, EPS));
    assert_eq!(h.state.active_basemap().map(|b| b.name()), Some("C"));
}

#[test]
fn switch_without_readable_camera_still_completes() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    h.a.set_camera_readable(false);
    let b_before = h.b.current_camera();
    assert_eq!(h.state.handle_basemap_change("B"), TransitionOutcome::Completed);
    assert_eq!(h.b.current_camera(), b_before);
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 1);
    assert_eq!(h.state.phase(), Phase::Enabled);
}

#[test]
fn extrusion_injection_is_idempotent() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    h.state.handle_basemap_change("A");
    h.state.handle_basemap_change("A");
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 1);
    assert!(h.a.snapshot().layer_by_id(EXTRUSION_LAYER_ID).is_some());
}

#[test]
fn extrusions_sit_beneath_first_text_label() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    let ids: Vec<String> = h.a.snapshot().layers.into_iter().map(|l| l.id).collect();
    let extrusion = ids.iter().position(|id| id == EXTRUSION_LAYER_ID).unwrap();
    assert_eq!(ids[extrusion + 1], "road-label");
}

#[test]
fn deferred_enable_finishes_on_style_ready() {
    let mut h = Harness::new();
    h.a.set_style_loaded(false);
    assert_eq!(h.state.enable(Some("A")), TransitionOutcome::Pending);
    assert_eq!(h.state.phase(), Phase::Enabling);
    assert_eq!(h.a.current_camera().zoom, 15.0);
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 0);

    h.a.set_style_loaded(true);
    h.state.on_style_ready("A");
    assert_eq!(h.state.phase(), Phase::Enabled);
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 1);
    assert_eq!(h.a.current_camera().pitch_deg(), 60.0);
}

#[test]
fn stale_ready_after_disable_is_harmless() {
    let mut h = Harness::new();
    h.a.set_style_loaded(false);
    h.state.enable(Some("A"));
    h.state.disable();

    h.a.set_style_loaded(true);
    h.state.on_style_ready("A");
    assert_eq!(h.a.count_layers_of_type("fill-extrusion"), 0);
    assert_eq!(h.state.pois().visible_marker_count(), 2);
    assert_eq!(h.state.mode(), ViewMode::TwoD);
}

#[test]
fn superseded_swap_does_not_touch_new_basemap() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    h.begin_loading("B");
    h.state.handle_basemap_change("B");
    h.state.handle_basemap_change("C");

    h.b.set_style_loaded(true);
    h.state.on_style_ready("B");
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 0);
    assert_eq!(h.c.count_layers_of_type("fill-extrusion"), 1);
}

#[test]
fn back_to_back_swaps_carry_the_original_camera() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    let tilted = CameraState::new(LatLon::new(48.2, 16.37), 16.0, 45.0, 70.0);
    set_camera(&h.a, tilted);

    h.begin_loading("B");
    assert_eq!(h.state.handle_basemap_change("B"), TransitionOutcome::Pending);
    assert_eq!(h.state.handle_basemap_change("C"), TransitionOutcome::Completed);
    assert!(h.c.current_camera().approx_eq(&tilted, EPS));

    h.b.set_style_loaded(true);
    h.state.on_style_ready("B");
    assert!(h.c.current_camera().approx_eq(&tilted, EPS));
    assert_eq!(h.state.active_basemap().map(|b| b.name()), Some("C"));
}

#[test]
fn failed_enable_keeps_previous_basemap() {
    let mut h = Harness::new();
    h.b.set_camera_readable(false);
    assert!(h.state.enable(Some("B")).is_failure());

    assert_eq!(h.state.mode(), ViewMode::TwoD);
    assert_eq!(h.state.active_basemap().map(|b| b.name()), Some("A"));
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 0);
    assert_eq!(h.state.pois().visible_marker_count(), 2);
    let events = h.events();
    assert!(events.contains(&ViewEvent::ToggleReverted { enabled: false }));
}

#[test]
fn deferred_enable_failure_leaves_no_3d_state() {
    let mut h = Harness::new();
    h.begin_loading("B");
    assert_eq!(h.state.enable(Some("B")), TransitionOutcome::Pending);
    assert_eq!(h.state.pois().visible_marker_count(), 0);
    assert!(h.state.compass().is_visible());
    h.events();

    h.b.set_camera_readable(false);
    h.b.set_style_loaded(true);
    h.state.on_style_ready("B");

    assert_eq!(h.state.phase(), Phase::Disabled);
    assert_eq!(h.state.active_basemap().map(|b| b.name()), Some("A"));
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 0);
    assert_eq!(h.state.pois().visible_marker_count(), 2);
    assert!(!h.state.compass().is_visible());
    assert!(!h.state.navigation().is_attached());
    let events = h.events();
    assert!(events.iter().any(|e| matches!(e, ViewEvent::Alert(_))));
    assert!(events.contains(&ViewEvent::ToggleReverted { enabled: false }));
    assert!(events.contains(&ViewEvent::ModeChanged(ViewMode::TwoD)));

    h.advance(1_000);
    assert!(h.events().is_empty());
}

#[test]
fn low_detail_in_2d_keeps_only_country_borders_and_major_roads() {
    let mut h = Harness::new();
    assert!(matches!(
        h.state.set_lod_level(LodLevel::Low),
        LodOutcome::Applied(_)
    ));
    let a = &h.a;
    assert!(visible(a, "admin-0-boundary"));
    assert!(!visible(a, "admin-1-boundary"));
    assert!(visible(a, "road-motorway"));
    assert!(!visible(a, "road-service"));
    assert!(!visible(a, "road-path"));
    for label in ["road-label", "settlement-minor-label", "country-label"] {
        assert!(!visible(a, label), "{label} should be hidden");
    }
    assert!(visible(a, "water"));
    assert_eq!(h.state.pois().visible_label_count(), 0);
    assert_eq!(h.state.pois().visible_marker_count(), 2);
}

#[test]
fn low_then_high_restores_original_visibility() {
    let mut h = Harness::new();
    let before = h.a.snapshot();
    h.state.set_lod_level(LodLevel::Low);
    h.state.set_lod_level(LodLevel::High);
    for layer in &before.layers {
        assert_eq!(
            h.a.visibility_of(&layer.id),
            Some(layer.visibility()),
            "{} changed",
            layer.id
        );
    }
    assert_eq!(h.state.pois().visible_label_count(), 2);
}

#[test]
fn medium_detail_fails_open_for_unmatched_roads() {
    let mut h = Harness::new();
    h.state.set_lod_level(LodLevel::Medium);
    assert!(visible(&h.a, "road-path"));
    assert!(visible(&h.a, "road-motorway"));
    assert!(!visible(&h.a, "road-service"));
    assert!(visible(&h.a, "country-label"));
    assert!(!visible(&h.a, "settlement-minor-label"));
}

#[test]
fn classification_is_stable() {
    let style = fixture_style();
    assert_eq!(classify_style(&style), classify_style(&style));
}

#[test]
fn persisted_level_survives_reload() {
    let prefs = SharedPrefs::default();
    let mut h = Harness::with_prefs(prefs.clone());
    h.state.set_lod_level(LodLevel::Medium);
    drop(h);

    let h = Harness::with_prefs(prefs.clone());
    assert_eq!(h.state.lod_level(), LodLevel::Medium);
    assert_eq!(h.state.pois().visible_label_count(), 0);

    let mut raw = prefs.clone();
    raw.set("castlemap.lod_level", "99").unwrap();
    let h = Harness::with_prefs(prefs);
    assert_eq!(h.state.lod_level(), LodLevel::High);
}

#[test]
fn level_is_persisted_even_without_ready_style() {
    let mut h = Harness::new();
    h.a.set_style_loaded(false);
    assert_eq!(h.state.set_lod_level(LodLevel::Low), LodOutcome::Deferred);
    assert_eq!(
        h.prefs.get("castlemap.lod_level").unwrap().as_deref(),
        Some("0")
    );
    assert!(visible(&h.a, "road-label"));

    h.a.set_style_loaded(true);
    h.state.on_style_ready("A");
    assert!(!visible(&h.a, "road-label"));
}

#[test]
fn deferred_level_is_announced_once_per_load() {
    let mut h = Harness::new();
    h.begin_loading("A");
    h.state.on_zoom_end();
    h.advance(50);
    h.state.on_zoom_end();
    h.advance(50);
    assert_eq!(h.state.set_lod_level(LodLevel::Low), LodOutcome::Deferred);
    let deferred = h
        .events()
        .into_iter()
        .filter(|e| matches!(e, ViewEvent::LodDeferred { .. }))
        .count();
    assert_eq!(deferred, 1);

    h.a.set_style_loaded(true);
    assert_eq!(h.state.on_style_ready("A"), 1);
    assert!(!visible(&h.a, "road-label"));
}

#[test]
fn zoom_end_is_debounced() {
    let mut h = Harness::new();
    h.state.on_zoom_end();
    h.advance(30);
    h.state.on_zoom_end();
    h.advance(30);
    assert!(h.events().is_empty());
    h.advance(20);
    let applied = h
        .events()
        .into_iter()
        .filter(|e| matches!(e, ViewEvent::LodApplied { .. }))
        .count();
    assert_eq!(applied, 1);
}

#[test]
fn basemap_change_in_2d_reapplies_after_settle() {
    let mut h = Harness::new();
    h.state.set_lod_level(LodLevel::Low);
    h.events();
    assert_eq!(h.state.handle_basemap_change("B"), TransitionOutcome::Completed);
    assert!(visible(&h.b, "road-label"));
    h.advance(249);
    assert!(visible(&h.b, "road-label"));
    h.advance(1);
    assert!(!visible(&h.b, "road-label"));
    assert_eq!(h.b.count_layers_of_type("fill-extrusion"), 0);
}

#[test]
fn compass_follows_bearing_while_shown() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    h.events();
    let cam = h.a.current_camera().with_bearing(30.0);
    set_camera(&h.a, cam);
    h.advance(100);
    assert_eq!(h.events(), vec![ViewEvent::CompassRotated { arrow_deg: -30.0 }]);

    h.state.disable();
    assert_eq!(h.state.compass().arrow_deg(), 0.0);
    h.events();
    h.advance(500);
    assert!(h.events().is_empty());
}

#[test]
fn reset_north_eases_back_to_tilted_north() {
    let mut h = Harness::new();
    h.state.enable(Some("A"));
    set_camera(&h.a, h.a.current_camera().with_bearing(120.0).with_pitch(20.0));
    h.state.reset_north().unwrap();
    let (target, duration) = h.a.last_ease().unwrap();
    assert_eq!(duration, 800);
    assert_eq!(target.bearing_deg(), 0.0);
    assert_eq!(target.pitch_deg(), 60.0);
}

#[test]
fn modifier_keys_rotate_only_in_3d() {
    let mut h = Harness::new();
    let shift = Modifiers {
        shift: true,
        alt: false,
    };
    assert!(!h.state.on_key(ArrowKey::Right, shift));

    h.state.enable(Some("A"));
    assert!(!h.state.on_key(ArrowKey::Right, Modifiers::default()));
    assert!(h.state.on_key(ArrowKey::Right, shift));
    assert_eq!(h.a.current_camera().bearing_deg(), 5.0);
    assert!(h.state.on_key(ArrowKey::Up, shift));
    assert_eq!(h.a.current_camera().pitch_deg(), 65.0);

    assert!(h.state.on_pointer_down(1, 10.0, 10.0, shift));
    assert!(h.state.on_pointer_move(1, 30.0, 10.0));
    assert_eq!(h.a.current_camera().bearing_deg(), 15.0);
    assert!(h.state.on_pointer_up(1));

    h.state.disable();
    assert!(!h.state.on_key(ArrowKey::Right, shift));
    assert!(!h.state.on_pointer_down(2, 0.0, 0.0, shift));
}

#[test]
fn failing_layer_does_not_block_the_rest() {
    let mut h = Harness::new();
    h.a.fail_layer("road-label");
    let LodOutcome::Applied(report) = h.state.set_lod_level(LodLevel::Low) else {
        panic!("expected an applied report");
    };
    assert_eq!(report.failed.len(), 1);
    assert!(!visible(&h.a, "country-label"));
    assert!(!visible(&h.a, "road-service"));
}
