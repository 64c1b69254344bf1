use crate::style::StyleLayer;
use crate::symbology::Visibility;

/// Render type of a style layer, reduced to what detail control cares about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RenderType {
    Symbol,
    Line,
    Fill,
    FillExtrusion,
    Other,
}

impl RenderType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "symbol" => RenderType::Symbol,
            "line" => RenderType::Line,
            "fill" => RenderType::Fill,
            "fill-extrusion" => RenderType::FillExtrusion,
            _ => RenderType::Other,
        }
    }
}

/// Read-only projection of one live style layer.
///
/// Descriptors are rebuilt from the backend's current style on every
/// classification pass and never cached across style swaps.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub id: String,
    pub render_type: RenderType,
    pub source_layer: Option<String>,
    /// Filter expression serialized to JSON text, if the layer has one.
    pub filter_text: Option<String>,
    pub has_text_field: bool,
    pub visibility: Visibility,
}

impl LayerDescriptor {
    pub fn from_style_layer(layer: &StyleLayer) -> Self {
        Self {
            id: layer.id.clone(),
            render_type: layer.render_type(),
            source_layer: layer.source_layer.clone(),
            filter_text: layer.filter.as_ref().map(|f| f.to_string()),
            has_text_field: layer.has_text_field(),
            visibility: layer.visibility(),
        }
    }

    pub fn from_style_layers(layers: &[StyleLayer]) -> Vec<Self> {
        layers.iter().map(Self::from_style_layer).collect()
    }
}
