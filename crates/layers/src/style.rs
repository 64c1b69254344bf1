//! Shallow model of a map-engine style document.
//!
//! Only what the classifier and the extrusion planner read is typed; paint,
//! layout and filter stay as raw JSON so unknown provider extensions pass
//! through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layer::RenderType;
use crate::symbology::Visibility;

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid style: {0}")]
    Invalid(String),
}

/// Complete style document as served by a basemap provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    /// Source definitions in declaration order.
    #[serde(default)]
    pub sources: Map<String, Value>,
    #[serde(default)]
    pub layers: Vec<StyleLayer>,
}

fn default_version() -> u32 {
    8
}

/// A single style layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub id: String,
    /// Raw layer type (`symbol`, `line`, `fill-extrusion`, ...).
    #[serde(rename = "type")]
    pub layer_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "source-layer", default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,
}

/// Parse a style document from JSON text.
pub fn parse_style_str(json: &str) -> Result<StyleDocument, StyleError> {
    let doc: StyleDocument = serde_json::from_str(json)?;
    validate_style(&doc)?;
    Ok(doc)
}

fn validate_style(doc: &StyleDocument) -> Result<(), StyleError> {
    if doc.version != 8 {
        return Err(StyleError::Invalid(format!(
            "Unsupported style version: {} (expected 8)",
            doc.version
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for layer in &doc.layers {
        if layer.id.trim().is_empty() {
            return Err(StyleError::Invalid("layer without id".to_string()));
        }
        if !seen.insert(layer.id.as_str()) {
            return Err(StyleError::Invalid(format!("duplicate layer id: {}", layer.id)));
        }
    }
    Ok(())
}

impl StyleDocument {
    pub fn layer_by_id(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_by_id_mut(&mut self, id: &str) -> Option<&mut StyleLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Insert `layer` before the layer with id `before`, or on top when
    /// `before` is `None` or unknown.
    pub fn insert_layer(&mut self, layer: StyleLayer, before: Option<&str>) {
        let idx = before
            .and_then(|id| self.layers.iter().position(|l| l.id == id))
            .unwrap_or(self.layers.len());
        self.layers.insert(idx, layer);
    }

    pub fn remove_layer(&mut self, id: &str) -> Option<StyleLayer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, layer_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer_type: layer_type.into(),
            ..Self::default()
        }
    }

    pub fn render_type(&self) -> RenderType {
        RenderType::parse(&self.layer_type)
    }

    /// Layout visibility; absent means visible.
    pub fn visibility(&self) -> Visibility {
        self.layout
            .get("visibility")
            .and_then(Value::as_str)
            .map(Visibility::parse)
            .unwrap_or_default()
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.layout.insert(
            "visibility".to_string(),
            Value::String(visibility.as_str().to_string()),
        );
    }

    pub fn has_text_field(&self) -> bool {
        self.layout
            .get("text-field")
            .is_some_and(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_style_json() -> &'static str {
        r##"{"version":8,"name":"Test","sources":{"openmaptiles":{"type":"vector"},"composite":{"type":"vector"}},"layers":[{"id":"background","type":"background"},{"id":"roads","type":"line","source":"openmaptiles","source-layer":"transportation","filter":["==","class","motorway"]},{"id":"place-city","type":"symbol","source":"openmaptiles","source-layer":"place","layout":{"text-field":"{name}","visibility":"none"}}]}"##
    }

    #[test]
    fn parses_layers_and_keeps_source_order() {
        let doc = parse_style_str(sample_style_json()).unwrap();
        assert_eq!(doc.layers.len(), 3);
        let sources: Vec<_> = doc.source_names().collect();
        assert_eq!(sources, vec!["openmaptiles", "composite"]);
    }

    #[test]
    fn reads_visibility_and_text_field() {
        let doc = parse_style_str(sample_style_json()).unwrap();
        let label = doc.layer_by_id("place-city").unwrap();
        assert_eq!(label.visibility(), Visibility::None);
        assert!(label.has_text_field());
        assert_eq!(doc.layer_by_id("roads").unwrap().visibility(), Visibility::Visible);
    }

    #[test]
    fn rejects_wrong_version_and_duplicates() {
        assert!(matches!(
            parse_style_str(r#"{"version":7,"layers":[]}"#),
            Err(StyleError::Invalid(_))
        ));
        assert!(matches!(
            parse_style_str(
                r#"{"version":8,"layers":[{"id":"a","type":"fill"},{"id":"a","type":"line"}]}"#
            ),
            Err(StyleError::Invalid(_))
        ));
    }

    #[test]
    fn insert_before_unknown_id_appends() {
        let mut doc = parse_style_str(sample_style_json()).unwrap();
        doc.insert_layer(StyleLayer::new("x", "fill"), Some("missing"));
        assert_eq!(doc.layers.last().unwrap().id, "x");
        doc.insert_layer(StyleLayer::new("y", "fill"), Some("roads"));
        assert_eq!(doc.layers[1].id, "y");
        assert!(doc.remove_layer("y").is_some());
        assert!(doc.remove_layer("y").is_none());
    }
}
