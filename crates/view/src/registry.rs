//! Fixed set of selectable basemaps and their backends.

use std::fmt;

use foundation::{BasemapId, StyleGeneration};
use runtime::StyleGate;

use crate::backend::MapBackend;
use crate::machine::Pending;

pub const DEFAULT_BASEMAP: &str = "Jawg Light";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub extrusion: bool,
    pub rotation: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            extrusion: true,
            rotation: true,
        }
    }
}

/// Static description of one basemap.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapSpec {
    pub name: String,
    /// Style URL; may contain `{maptiler_key}` or `{jawg_token}`.
    pub style_url: String,
    pub capabilities: Capabilities,
}

impl BasemapSpec {
    pub fn new(name: impl Into<String>, style_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style_url: style_url.into(),
            capabilities: Capabilities::default(),
        }
    }

    /// Style URL with `{placeholder}` segments substituted.
    pub fn resolve_style_url(&self, keys: &[(&str, &str)]) -> String {
        keys.iter().fold(self.style_url.clone(), |url, (name, value)| {
            url.replace(&format!("{{{name}}}"), value)
        })
    }
}

/// The six basemaps offered by the page, in menu order.
pub fn default_catalogue() -> Vec<BasemapSpec> {
    vec![
        BasemapSpec::new(
            "OpenStreetMap",
            "https://api.maptiler.com/maps/openstreetmap/style.json?key={maptiler_key}",
        ),
        BasemapSpec::new(
            "OpenStreetMap.HOT",
            "https://api.maptiler.com/maps/bright/style.json?key={maptiler_key}",
        ),
        BasemapSpec::new(
            "MapTiler Dataviz",
            "https://api.maptiler.com/maps/dataviz/style.json?key={maptiler_key}",
        ),
        BasemapSpec::new(
            "MapTiler Toner",
            "https://api.maptiler.com/maps/toner-v2/style.json?key={maptiler_key}",
        ),
        BasemapSpec::new(
            "Jawg Light",
            "https://api.jawg.io/styles/jawg-light.json?access-token={jawg_token}",
        ),
        BasemapSpec::new(
            "Jawg Dark",
            "https://api.jawg.io/styles/jawg-dark.json?access-token={jawg_token}",
        ),
    ]
}

pub struct BasemapHandle {
    id: BasemapId,
    spec: BasemapSpec,
    backend: Option<Box<dyn MapBackend>>,
    generation: StyleGeneration,
    pub(crate) gate: StyleGate<Pending>,
}

impl fmt::Debug for BasemapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasemapHandle")
            .field("id", &self.id)
            .field("name", &self.spec.name)
            .field("attached", &self.backend.is_some())
            .field("generation", &self.generation)
            .field("readiness", &self.gate.readiness())
            .finish()
    }
}

impl BasemapHandle {
    pub fn id(&self) -> BasemapId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &BasemapSpec {
        &self.spec
    }

    pub fn capabilities(&self) -> Capabilities {
        self.spec.capabilities
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Identity of the style instance currently loaded on this backend.
    pub fn generation(&self) -> StyleGeneration {
        self.generation
    }

    pub fn backend(&self) -> Option<&dyn MapBackend> {
        self.backend.as_deref()
    }

    pub fn backend_mut(&mut self) -> Option<&mut (dyn MapBackend + 'static)> {
        self.backend.as_deref_mut()
    }

    pub(crate) fn style_loaded(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_style_loaded())
    }

    /// The backend began loading a different style.
    pub(crate) fn begin_style_load(&mut self) {
        self.generation = self.generation.next();
        self.gate.mark_loading();
    }
}

/// Registry keyed by display name; the set of basemaps never changes after
/// construction, only their attached backends do.
#[derive(Debug, Default)]
pub struct BasemapRegistry {
    handles: Vec<BasemapHandle>,
}

impl BasemapRegistry {
    pub fn new(specs: impl IntoIterator<Item = BasemapSpec>) -> Self {
        let mut handles: Vec<BasemapHandle> = Vec::new();
        for spec in specs {
            if handles.iter().any(|h| h.spec.name == spec.name) {
                tracing::warn!(name = %spec.name, "duplicate basemap name ignored");
                continue;
            }
            handles.push(BasemapHandle {
                id: BasemapId::new(handles.len() as u32),
                spec,
                backend: None,
                generation: StyleGeneration::default(),
                gate: StyleGate::new(),
            });
        }
        Self { handles }
    }

    pub fn with_default_catalogue() -> Self {
        Self::new(default_catalogue())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<BasemapId> {
        self.handles.iter().find(|h| h.spec.name == name).map(|h| h.id)
    }

    pub fn get(&self, id: BasemapId) -> Option<&BasemapHandle> {
        self.handles.get(id.index())
    }

    pub fn get_mut(&mut self, id: BasemapId) -> Option<&mut BasemapHandle> {
        self.handles.get_mut(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasemapHandle> {
        self.handles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BasemapHandle> {
        self.handles.iter_mut()
    }

    /// Attach an instantiated backend. Any previous backend is returned; the
    /// new one starts with a fresh style instance.
    pub fn attach(&mut self, id: BasemapId, backend: Box<dyn MapBackend>) -> Option<Box<dyn MapBackend>> {
        let handle = self.get_mut(id)?;
        let previous = handle.backend.replace(backend);
        handle.begin_style_load();
        previous
    }

    /// Detach the backend. Continuations parked on it are dropped unrun.
    pub fn detach(&mut self, id: BasemapId) -> Option<Box<dyn MapBackend>> {
        let handle = self.get_mut(id)?;
        handle.gate.clear();
        handle.backend.take()
    }
}
