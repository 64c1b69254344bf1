//! In-process backend: a style document plus a camera, no rendering.
//!
//! Clones share state, so a caller can hand one clone to the registry and
//! keep another to observe or script it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use foundation::{CameraState, LatLon};
use layers::{StyleDocument, StyleLayer, Visibility};

use crate::backend::{Interaction, MapBackend};
use crate::error::BackendError;

const BLANK_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Debug)]
struct MemoryMap {
    camera: CameraState,
    style: StyleDocument,
    style_loaded: bool,
    camera_readable: bool,
    interactions: HashMap<Interaction, bool>,
    failing_layers: HashSet<String>,
    canvas: Option<String>,
    jumps: usize,
    eases: Vec<(CameraState, u64)>,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            camera: CameraState::flat(LatLon::default(), 2.0),
            style: StyleDocument::default(),
            style_loaded: true,
            camera_readable: true,
            interactions: HashMap::new(),
            failing_layers: HashSet::new(),
            canvas: Some(BLANK_PNG_DATA_URL.to_string()),
            jumps: 0,
            eases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<MemoryMap>>,
}

impl MemoryBackend {
    pub fn new(style: StyleDocument) -> Self {
        let backend = Self::default();
        backend.inner.borrow_mut().style = style;
        backend
    }

    pub fn with_camera(self, camera: CameraState) -> Self {
        self.inner.borrow_mut().camera = camera;
        self
    }

    /// Start in the "style still loading" state.
    pub fn loading(self) -> Self {
        self.inner.borrow_mut().style_loaded = false;
        self
    }

    pub fn set_style_loaded(&self, loaded: bool) {
        self.inner.borrow_mut().style_loaded = loaded;
    }

    /// Swap in a new style document; it counts as loading until
    /// `set_style_loaded(true)`.
    pub fn replace_style(&self, style: StyleDocument) {
        let mut map = self.inner.borrow_mut();
        map.style = style;
        map.style_loaded = false;
    }

    /// Make every visibility write to `layer_id` fail.
    pub fn fail_layer(&self, layer_id: impl Into<String>) {
        self.inner.borrow_mut().failing_layers.insert(layer_id.into());
    }

    pub fn set_camera_readable(&self, readable: bool) {
        self.inner.borrow_mut().camera_readable = readable;
    }

    pub fn set_canvas(&self, data_url: Option<String>) {
        self.inner.borrow_mut().canvas = data_url;
    }

    /// Camera regardless of `camera_readable`.
    pub fn current_camera(&self) -> CameraState {
        self.inner.borrow().camera
    }

    pub fn snapshot(&self) -> StyleDocument {
        self.inner.borrow().style.clone()
    }

    pub fn visibility_of(&self, layer_id: &str) -> Option<Visibility> {
        self.inner.borrow().style.layer_by_id(layer_id).map(StyleLayer::visibility)
    }

    pub fn interaction(&self, interaction: Interaction) -> Option<bool> {
        self.inner.borrow().interactions.get(&interaction).copied()
    }

    pub fn count_layers_of_type(&self, layer_type: &str) -> usize {
        self.inner
            .borrow()
            .style
            .layers
            .iter()
            .filter(|l| l.layer_type == layer_type)
            .count()
    }

    pub fn jump_count(&self) -> usize {
        self.inner.borrow().jumps
    }

    pub fn last_ease(&self) -> Option<(CameraState, u64)> {
        self.inner.borrow().eases.last().copied()
    }

    fn require_loaded(map: &MemoryMap) -> Result<(), BackendError> {
        if map.style_loaded {
            Ok(())
        } else {
            Err(BackendError::StyleNotLoaded)
        }
    }
}

impl MapBackend for MemoryBackend {
    fn camera(&self) -> Result<CameraState, BackendError> {
        let map = self.inner.borrow();
        if !map.camera_readable {
            return Err(BackendError::Host("camera unavailable".to_string()));
        }
        Ok(map.camera)
    }

    fn jump_to(&mut self, camera: &CameraState) -> Result<(), BackendError> {
        let mut map = self.inner.borrow_mut();
        map.camera = *camera;
        map.jumps += 1;
        Ok(())
    }

    fn ease_to(&mut self, camera: &CameraState, duration_ms: u64) -> Result<(), BackendError> {
        let mut map = self.inner.borrow_mut();
        map.camera = *camera;
        map.eases.push((*camera, duration_ms));
        Ok(())
    }

    fn is_style_loaded(&self) -> bool {
        self.inner.borrow().style_loaded
    }

    fn style(&self) -> Result<StyleDocument, BackendError> {
        let map = self.inner.borrow();
        Self::require_loaded(&map)?;
        Ok(map.style.clone())
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<(), BackendError> {
        let mut map = self.inner.borrow_mut();
        Self::require_loaded(&map)?;
        if map.failing_layers.contains(layer_id) {
            return Err(BackendError::Rejected {
                layer: layer_id.to_string(),
                reason: "visibility is not settable".to_string(),
            });
        }
        let layer = map
            .style
            .layer_by_id_mut(layer_id)
            .ok_or_else(|| BackendError::UnknownLayer(layer_id.to_string()))?;
        layer.set_visibility(visibility);
        Ok(())
    }

    fn add_layer(&mut self, layer: &StyleLayer, before: Option<&str>) -> Result<(), BackendError> {
        let mut map = self.inner.borrow_mut();
        Self::require_loaded(&map)?;
        if map.style.layer_by_id(&layer.id).is_some() {
            return Err(BackendError::DuplicateLayer(layer.id.clone()));
        }
        map.style.insert_layer(layer.clone(), before);
        Ok(())
    }

    fn remove_layer(&mut self, layer_id: &str) -> Result<(), BackendError> {
        let mut map = self.inner.borrow_mut();
        map.style
            .remove_layer(layer_id)
            .map(|_| ())
            .ok_or_else(|| BackendError::UnknownLayer(layer_id.to_string()))
    }

    fn set_interaction(&mut self, interaction: Interaction, enabled: bool) -> Result<(), BackendError> {
        self.inner.borrow_mut().interactions.insert(interaction, enabled);
        Ok(())
    }

    fn canvas_data_url(&self) -> Result<String, BackendError> {
        self.inner
            .borrow()
            .canvas
            .clone()
            .ok_or_else(|| BackendError::Host("canvas is not readable".to_string()))
    }
}
