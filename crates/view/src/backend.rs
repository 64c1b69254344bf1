//! Boundary to the external map-rendering engine.

use foundation::CameraState;
use layers::{StyleDocument, StyleLayer, Visibility};

use crate::error::BackendError;

/// Input handlers a backend can switch on and off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Interaction {
    DragPan,
    DragRotate,
    TouchPitch,
    TouchZoomRotate,
    ScrollZoom,
    Keyboard,
    DoubleClickZoom,
}

impl Interaction {
    pub fn as_str(self) -> &'static str {
        match self {
            Interaction::DragPan => "dragPan",
            Interaction::DragRotate => "dragRotate",
            Interaction::TouchPitch => "touchPitch",
            Interaction::TouchZoomRotate => "touchZoomRotate",
            Interaction::ScrollZoom => "scrollZoom",
            Interaction::Keyboard => "keyboard",
            Interaction::DoubleClickZoom => "doubleClickZoom",
        }
    }
}

/// Handler states applied when the 3D view activates.
pub const PROFILE_3D: [(Interaction, bool); 5] = [
    (Interaction::DragRotate, true),
    (Interaction::TouchPitch, true),
    (Interaction::TouchZoomRotate, true),
    (Interaction::Keyboard, true),
    (Interaction::DoubleClickZoom, false),
];

/// Handler states restored when the 3D view is left.
pub const PROFILE_2D: [(Interaction, bool); 5] = [
    (Interaction::DragRotate, false),
    (Interaction::TouchPitch, false),
    (Interaction::TouchZoomRotate, false),
    (Interaction::Keyboard, true),
    (Interaction::DoubleClickZoom, true),
];

/// One instantiated rendering backend.
///
/// All calls are synchronous. Readiness of the style is reported to the view
/// core by the host (`on_style_ready`), but `is_style_loaded` is consulted
/// first so a missed signal never strands a request.
pub trait MapBackend {
    fn camera(&self) -> Result<CameraState, BackendError>;

    /// Move instantly, without animation.
    fn jump_to(&mut self, camera: &CameraState) -> Result<(), BackendError>;

    fn ease_to(&mut self, camera: &CameraState, duration_ms: u64) -> Result<(), BackendError>;

    fn is_style_loaded(&self) -> bool;

    /// Snapshot of the live style, including current layout visibility.
    fn style(&self) -> Result<StyleDocument, BackendError>;

    fn set_layer_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<(), BackendError>;

    fn add_layer(&mut self, layer: &StyleLayer, before: Option<&str>) -> Result<(), BackendError>;

    fn remove_layer(&mut self, layer_id: &str) -> Result<(), BackendError>;

    fn set_interaction(&mut self, interaction: Interaction, enabled: bool) -> Result<(), BackendError>;

    /// PNG data URL of the current canvas.
    fn canvas_data_url(&self) -> Result<String, BackendError>;
}

/// Apply a handler profile. Stops at the first failure.
pub fn apply_profile(backend: &mut dyn MapBackend, profile: &[(Interaction, bool)]) -> Result<(), BackendError> {
    for &(interaction, enabled) in profile {
        backend.set_interaction(interaction, enabled)?;
    }
    Ok(())
}
