//! Offline inspection of styles, detail levels and POI data for the castle
//! map. Backs the `castlemap` binary.

use std::fs;
use std::path::Path;

use foundation::{BasemapId, StyleGeneration};
use layers::{LayerRole, LodLevel, StyleDocument, Visibility, classify_style, parse_style_str};
use poi::{PoiLoad, parse_pois};
use serde::Serialize;
use view::lod::LodEngine;
use view::memory::MemoryBackend;
use view::registry::default_catalogue;
use view::{MapBackend, ViewConfig};

/// Environment variable naming a JSON file with [`ViewConfig`] overrides.
pub const CONFIG_ENV: &str = "CASTLEMAP_CONFIG";

pub fn read_style(path: &Path) -> Result<StyleDocument, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    parse_style_str(&text).map_err(|e| format!("{path:?}: {e}"))
}

/// Defaults, overlaid with `path` or else the file named by `CASTLEMAP_CONFIG`.
pub fn load_config(path: Option<&Path>) -> Result<ViewConfig, String> {
    let from_env = std::env::var_os(CONFIG_ENV).map(std::path::PathBuf::from);
    let Some(path) = path.map(Path::to_path_buf).or(from_env) else {
        return Ok(ViewConfig::default());
    };
    let text = fs::read_to_string(&path).map_err(|e| format!("read {path:?}: {e}"))?;
    ViewConfig::from_json(&text).map_err(|e| format!("{path:?}: {e}"))
}

pub fn role_label(role: LayerRole) -> String {
    match role {
        LayerRole::Label { major_place: true } => "label (major place)".to_string(),
        LayerRole::Label { major_place: false } => "label".to_string(),
        LayerRole::Boundary {
            admin_level,
            is_country,
        } => {
            let mut s = "boundary".to_string();
            if let Some(level) = admin_level {
                s.push_str(&format!(" admin_level={level}"));
            }
            if is_country {
                s.push_str(" country");
            }
            s
        }
        LayerRole::Road { major, minor } => match (major, minor) {
            (true, true) => "road (major+minor)".to_string(),
            (true, false) => "road (major)".to_string(),
            (false, true) => "road (minor)".to_string(),
            (false, false) => "road".to_string(),
        },
        LayerRole::BuildingExtrusion => "building extrusion".to_string(),
        LayerRole::Other => "other".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRow {
    pub id: String,
    pub role: String,
}

pub fn classify_rows(style: &StyleDocument) -> Vec<RoleRow> {
    classify_style(style)
        .iter()
        .map(|l| RoleRow {
            id: l.id.clone(),
            role: role_label(l.role),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerVisibility {
    pub id: String,
    pub before: &'static str,
    pub after: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LodPreview {
    pub level: LodLevel,
    pub shown: usize,
    pub hidden: usize,
    pub unchanged: usize,
    pub layers: Vec<LayerVisibility>,
}

/// Apply `level` to a copy of `style` and report what changed.
pub fn preview_lod(style: &StyleDocument, level: LodLevel) -> Result<LodPreview, String> {
    let backend = MemoryBackend::new(style.clone());
    let mut target = backend.clone();
    let mut engine = LodEngine::new(level, "preview");
    let report = engine
        .apply(BasemapId::new(0), StyleGeneration(0), &mut target)
        .map_err(|e| e.to_string())?;
    if let Some(first) = report.failed.first() {
        return Err(first.to_string());
    }
    let after = target.style().map_err(|e| e.to_string())?;
    let layers = style
        .layers
        .iter()
        .map(|l| LayerVisibility {
            id: l.id.clone(),
            before: l.visibility().as_str(),
            after: after
                .layer_by_id(&l.id)
                .map(|a| a.visibility())
                .unwrap_or(Visibility::None)
                .as_str(),
        })
        .collect();
    Ok(LodPreview {
        level,
        shown: report.shown,
        hidden: report.hidden,
        unchanged: report.unchanged,
        layers,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiRow {
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    pub has_image: bool,
    pub has_description: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiSummary {
    pub total_features: usize,
    pub kept: usize,
    pub filtered_out: usize,
    pub skipped_geometry: usize,
    pub pois: Vec<PoiRow>,
}

impl From<PoiLoad> for PoiSummary {
    fn from(load: PoiLoad) -> Self {
        Self {
            total_features: load.total_features,
            kept: load.records.len(),
            filtered_out: load.filtered_out,
            skipped_geometry: load.skipped_geometry,
            pois: load
                .records
                .into_iter()
                .map(|r| PoiRow {
                    title: r.title,
                    lat: r.position.lat_deg,
                    lon: r.position.lon_deg,
                    has_image: r.image.is_some(),
                    has_description: r.description.is_some(),
                })
                .collect(),
        }
    }
}

pub fn summarize_pois(geojson: &str, config: &ViewConfig) -> Result<PoiSummary, String> {
    parse_pois(geojson, &config.poi_filter)
        .map(PoiSummary::from)
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasemapRow {
    pub name: String,
    pub style_url: String,
    pub extrusion: bool,
    pub rotation: bool,
}

pub fn basemap_rows(maptiler_key: &str, jawg_token: &str) -> Vec<BasemapRow> {
    default_catalogue()
        .into_iter()
        .map(|spec| BasemapRow {
            style_url: spec.resolve_style_url(&[("maptiler_key", maptiler_key), ("jawg_token", jawg_token)]),
            name: spec.name,
            extrusion: spec.capabilities.extrusion,
            rotation: spec.capabilities.rotation,
        })
        .collect()
}
