//! Planning of the 3D building-extrusion layer for an arbitrary style.

use serde_json::{Value, json};

use crate::layer::RenderType;
use crate::style::{StyleDocument, StyleLayer};

/// Id of the extrusion layer this crate injects.
pub const EXTRUSION_LAYER_ID: &str = "3d-buildings";

/// Vector sources known to carry a building layer, in preference order.
const KNOWN_VECTOR_SOURCES: [&str; 3] = ["composite", "openmaptiles", "jawg"];

const DEFAULT_SOURCE_LAYER: &str = "building";
const EXTRUSION_COLOR: &str = "#aaaaaa";
const EXTRUSION_OPACITY: f64 = 0.85;
/// Zoom span over which extrusions grow from flat to full height.
const FADE_IN_ZOOM_SPAN: f64 = 0.05;

/// Where the building geometry lives in a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSource {
    pub source: String,
    pub source_layer: String,
    /// `true` when an existing layer referenced a building source-layer,
    /// `false` when the source was guessed from the source list.
    pub detected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtrusionPlan {
    /// A fill-extrusion layer already targets a building source-layer.
    AlreadyPresent { layer_id: String },
    Insert {
        layer: StyleLayer,
        /// Insert beneath this layer; `None` means on top.
        before: Option<String>,
    },
    /// The style declares no source at all.
    NoBuildingSource,
}

/// Decide what to add to `style` so buildings render as extrusions.
///
/// Existence is checked against the live layer list rather than any local
/// bookkeeping because the style can be replaced underneath us.
pub fn plan_extrusion(style: &StyleDocument, min_zoom: f64) -> ExtrusionPlan {
    if let Some(existing) = existing_building_extrusion(style) {
        return ExtrusionPlan::AlreadyPresent {
            layer_id: existing.id.clone(),
        };
    }
    let Some(source) = detect_building_source(style) else {
        return ExtrusionPlan::NoBuildingSource;
    };
    ExtrusionPlan::Insert {
        layer: extrusion_layer(&source, min_zoom),
        before: first_text_symbol_layer(style).map(|l| l.id.clone()),
    }
}

pub fn existing_building_extrusion(style: &StyleDocument) -> Option<&StyleLayer> {
    style.layers.iter().find(|l| {
        l.render_type() == RenderType::FillExtrusion
            && l
                .source_layer
                .as_deref()
                .is_some_and(|sl| sl.to_ascii_lowercase().contains("building"))
    })
}

/// Reuse the source of any layer drawing a building source-layer; otherwise
/// fall back to well-known vector sources, then to the first declared one.
pub fn detect_building_source(style: &StyleDocument) -> Option<BuildingSource> {
    for layer in &style.layers {
        let (Some(source), Some(source_layer)) = (&layer.source, &layer.source_layer) else {
            continue;
        };
        if source_layer.to_ascii_lowercase().contains("building") {
            return Some(BuildingSource {
                source: source.clone(),
                source_layer: source_layer.clone(),
                detected: true,
            });
        }
    }

    let fallback = KNOWN_VECTOR_SOURCES
        .iter()
        .find(|name| style.sources.contains_key(**name))
        .map(|name| name.to_string())
        .or_else(|| style.source_names().next().map(str::to_string))?;

    Some(BuildingSource {
        source: fallback,
        source_layer: DEFAULT_SOURCE_LAYER.to_string(),
        detected: false,
    })
}

/// First symbol layer that draws text; buildings go beneath it.
pub fn first_text_symbol_layer(style: &StyleDocument) -> Option<&StyleLayer> {
    style
        .layers
        .iter()
        .find(|l| l.render_type() == RenderType::Symbol && l.has_text_field())
}

/// Build the fill-extrusion layer. Heights come from the feature's `height`
/// and `min_height` (defaulting to 10 and 0) and ramp in between `min_zoom`
/// and `min_zoom + 0.05`.
pub fn extrusion_layer(source: &BuildingSource, min_zoom: f64) -> StyleLayer {
    let mut layer = StyleLayer::new(EXTRUSION_LAYER_ID, "fill-extrusion");
    layer.source = Some(source.source.clone());
    layer.source_layer = Some(source.source_layer.clone());
    layer.minzoom = Some(min_zoom);

    let ramp = |property: &str, fallback: f64| -> Value {
        json!([
            "interpolate", ["linear"], ["zoom"],
            min_zoom, 0,
            min_zoom + FADE_IN_ZOOM_SPAN, ["coalesce", ["get", property], fallback]
        ])
    };

    layer
        .paint
        .insert("fill-extrusion-color".to_string(), json!(EXTRUSION_COLOR));
    layer
        .paint
        .insert("fill-extrusion-opacity".to_string(), json!(EXTRUSION_OPACITY));
    layer
        .paint
        .insert("fill-extrusion-height".to_string(), ramp("height", 10.0));
    layer
        .paint
        .insert("fill-extrusion-base".to_string(), ramp("min_height", 0.0));
    layer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::parse_style_str;

    fn style(json: &str) -> StyleDocument {
        parse_style_str(json).unwrap()
    }

    #[test]
    fn detects_source_from_building_layer() {
        let s = style(
            r#"{"version":8,"sources":{"a":{},"maptiler_planet":{}},"layers":[
                {"id":"building-fill","type":"fill","source":"maptiler_planet","source-layer":"Building"},
                {"id":"label","type":"symbol","source":"a","source-layer":"place","layout":{"text-field":"{name}"}}
            ]}"#,
        );
        let plan = plan_extrusion(&s, 15.0);
        let ExtrusionPlan::Insert { layer, before } = plan else {
            panic!("expected insert, got {plan:?}");
        };
        assert_eq!(layer.source.as_deref(), Some("maptiler_planet"));
        assert_eq!(layer.source_layer.as_deref(), Some("Building"));
        assert_eq!(before.as_deref(), Some("label"));
        assert_eq!(layer.minzoom, Some(15.0));
        assert_eq!(layer.paint["fill-extrusion-opacity"], json!(0.85));
        assert_eq!(
            layer.paint["fill-extrusion-height"][6],
            json!(["coalesce", ["get", "height"], 10.0])
        );
    }

    #[test]
    fn falls_back_to_known_then_first_source() {
        let known = style(r#"{"version":8,"sources":{"x":{},"openmaptiles":{}},"layers":[]}"#);
        let src = detect_building_source(&known).unwrap();
        assert_eq!(src.source, "openmaptiles");
        assert_eq!(src.source_layer, "building");
        assert!(!src.detected);

        let first = style(r#"{"version":8,"sources":{"zeta":{},"alpha":{}},"layers":[]}"#);
        assert_eq!(detect_building_source(&first).unwrap().source, "zeta");
    }

    #[test]
    fn no_sources_means_no_plan() {
        let empty = style(r#"{"version":8,"sources":{},"layers":[]}"#);
        assert_eq!(plan_extrusion(&empty, 15.0), ExtrusionPlan::NoBuildingSource);
    }

    #[test]
    fn existing_extrusion_is_reused() {
        let s = style(
            r#"{"version":8,"sources":{"composite":{}},"layers":[
                {"id":"building-extrusion","type":"fill-extrusion","source":"composite","source-layer":"building"}
            ]}"#,
        );
        assert_eq!(
            plan_extrusion(&s, 15.0),
            ExtrusionPlan::AlreadyPresent {
                layer_id: "building-extrusion".to_string()
            }
        );
    }

    #[test]
    fn symbols_without_text_do_not_anchor_placement() {
        let s = style(
            r#"{"version":8,"sources":{"composite":{}},"layers":[
                {"id":"icons","type":"symbol","source":"composite","layout":{"icon-image":"x"}}
            ]}"#,
        );
        let ExtrusionPlan::Insert { before, .. } = plan_extrusion(&s, 15.0) else {
            panic!("expected insert");
        };
        assert_eq!(before, None);
    }
}
