//! Level-of-detail engine: persisted level plus per-style visibility writes.

use std::collections::HashMap;

use foundation::{BasemapId, StyleGeneration};
use layers::{Directive, LodLevel, Visibility, classify_style, directive_for};
use prefs::PrefsStore;

use crate::backend::MapBackend;
use crate::error::{BackendError, ViewError};

/// Visibility of each layer as first observed, per style instance.
///
/// Entries belong to one `(basemap, generation)` pair. A new generation on
/// the same basemap means a new style, so its entries are discarded.
#[derive(Debug, Default)]
pub struct OriginalVisibility {
    styles: HashMap<BasemapId, StyleOriginals>,
}

#[derive(Debug, Default)]
struct StyleOriginals {
    generation: StyleGeneration,
    entries: HashMap<String, Visibility>,
}

impl OriginalVisibility {
    fn for_style(&mut self, basemap: BasemapId, generation: StyleGeneration) -> &mut HashMap<String, Visibility> {
        let slot = self.styles.entry(basemap).or_default();
        if slot.generation != generation {
            slot.generation = generation;
            slot.entries.clear();
        }
        &mut slot.entries
    }

    pub fn get(&self, basemap: BasemapId, generation: StyleGeneration, layer_id: &str) -> Option<Visibility> {
        self.styles
            .get(&basemap)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.entries.get(layer_id).copied())
    }

    pub fn captured_count(&self, basemap: BasemapId, generation: StyleGeneration) -> usize {
        self.styles
            .get(&basemap)
            .filter(|s| s.generation == generation)
            .map_or(0, |s| s.entries.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub level: LodLevel,
    pub classified: usize,
    pub shown: usize,
    pub hidden: usize,
    pub unchanged: usize,
    pub failed: Vec<ViewError>,
}

impl ApplyReport {
    pub fn written(&self) -> usize {
        self.shown + self.hidden
    }
}

#[derive(Debug)]
pub struct LodEngine {
    level: LodLevel,
    storage_key: String,
    originals: OriginalVisibility,
}

impl LodEngine {
    pub fn new(level: LodLevel, storage_key: impl Into<String>) -> Self {
        Self {
            level,
            storage_key: storage_key.into(),
            originals: OriginalVisibility::default(),
        }
    }

    /// Start from the persisted level; missing or invalid values use `default`.
    pub fn restore(store: &dyn PrefsStore, storage_key: &str, default: LodLevel) -> Self {
        let raw = prefs::get_or_none(store, storage_key);
        let level = raw.as_deref().and_then(LodLevel::parse).unwrap_or_else(|| {
            if let Some(raw) = &raw {
                tracing::warn!(value = %raw, %default, "ignoring invalid persisted detail level");
            }
            default
        });
        Self::new(level, storage_key)
    }

    pub fn level(&self) -> LodLevel {
        self.level
    }

    pub fn originals(&self) -> &OriginalVisibility {
        &self.originals
    }

    /// Record and persist `level`. Storage failures are logged; the level
    /// still takes effect for this session.
    pub fn set_level(&mut self, level: LodLevel, store: &mut dyn PrefsStore) {
        self.level = level;
        let value = level.index().to_string();
        if let Err(e) = store.set(&self.storage_key, &value) {
            tracing::warn!(key = %self.storage_key, error = %e, "could not persist detail level");
        }
    }

    /// Apply the current level to one backend's live style.
    ///
    /// The style is classified afresh on every call. Failures on individual
    /// layers are logged and reported; the remaining layers are still updated.
    pub fn apply(
        &mut self,
        basemap: BasemapId,
        generation: StyleGeneration,
        backend: &mut dyn MapBackend,
    ) -> Result<ApplyReport, BackendError> {
        if !backend.is_style_loaded() {
            return Err(BackendError::StyleNotLoaded);
        }
        let style = backend.style()?;
        let classified = classify_style(&style);
        let level = self.level;
        let originals = self.originals.for_style(basemap, generation);

        let mut report = ApplyReport {
            level,
            classified: classified.len(),
            ..ApplyReport::default()
        };

        for layer in classified.iter() {
            let directive = directive_for(level, layer.role);
            if directive == Directive::Untouched {
                continue;
            }
            let current = style
                .layer_by_id(&layer.id)
                .map(|l| l.visibility())
                .unwrap_or_default();
            let original = *originals.entry(layer.id.clone()).or_insert(current);
            let target = match directive {
                Directive::Show => Visibility::Visible,
                Directive::Hide => Visibility::None,
                Directive::Restore => original,
                Directive::Untouched => continue,
            };
            if target == current {
                report.unchanged += 1;
                continue;
            }
            match backend.set_layer_visibility(&layer.id, target) {
                Ok(()) if target.is_visible() => report.shown += 1,
                Ok(()) => report.hidden += 1,
                Err(source) => {
                    tracing::warn!(layer = %layer.id, error = %source, "layer visibility update failed");
                    report.failed.push(ViewError::LayerMutation {
                        layer: layer.id.clone(),
                        source,
                    });
                }
            }
        }

        tracing::debug!(
            %basemap,
            %level,
            shown = report.shown,
            hidden = report.hidden,
            failed = report.failed.len(),
            "applied detail level"
        );
        Ok(report)
    }
}
