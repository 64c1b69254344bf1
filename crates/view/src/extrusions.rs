use layers::extrusion::{EXTRUSION_LAYER_ID, ExtrusionPlan, plan_extrusion};

use crate::backend::MapBackend;
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtrusionOutcome {
    Added { layer_id: String },
    AlreadyPresent { layer_id: String },
    NoBuildingSource,
}

/// Add the building-extrusion layer to the backend's live style.
///
/// With `reset_camera` the view is tilted to `pitch_deg` facing north; without
/// it the camera is left to the caller.
pub fn add_extrusions(
    backend: &mut dyn MapBackend,
    reset_camera: bool,
    min_zoom: f64,
    pitch_deg: f64,
) -> Result<ExtrusionOutcome, BackendError> {
    let style = backend.style()?;
    let outcome = match plan_extrusion(&style, min_zoom) {
        ExtrusionPlan::AlreadyPresent { layer_id } => ExtrusionOutcome::AlreadyPresent { layer_id },
        ExtrusionPlan::Insert { layer, before } => {
            backend.add_layer(&layer, before.as_deref())?;
            tracing::debug!(before = ?before, source = ?layer.source, "added building extrusions");
            ExtrusionOutcome::Added { layer_id: layer.id }
        }
        ExtrusionPlan::NoBuildingSource => {
            tracing::warn!(style = %style.name, "style declares no source; skipping building extrusions");
            ExtrusionOutcome::NoBuildingSource
        }
    };

    if reset_camera {
        let camera = backend.camera()?;
        backend.jump_to(&camera.with_pitch(pitch_deg).with_bearing(0.0))?;
    }
    Ok(outcome)
}

/// Remove the injected extrusion layer. Returns whether one was present.
pub fn remove_extrusions(backend: &mut dyn MapBackend) -> Result<bool, BackendError> {
    match backend.remove_layer(EXTRUSION_LAYER_ID) {
        Ok(()) => Ok(true),
        Err(BackendError::UnknownLayer(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
