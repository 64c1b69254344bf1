//! Heuristic role classification of style layers.
//!
//! Layer naming is not standardized across style providers, so roles are
//! inferred from case-insensitive pattern matches on the layer id, its
//! `source-layer`, and its filter expression serialized to text. Matching is
//! best-effort and order-sensitive; anything unrecognized is `Other` and is
//! left alone by detail control.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::layer::{LayerDescriptor, RenderType};
use crate::style::StyleDocument;

static BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)boundar|admin|border").expect("valid boundary regex"));
static ADMIN_LEVEL_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:admin|boundary)[-_ ]?(?:level[-_ ]?)?(\d{1,2})(?:\D|$)")
        .expect("valid admin level regex")
});
static ADMIN_LEVEL_FILTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)admin_level"?\s*[,:=]\s*"?(\d{1,2})"#).expect("valid admin filter regex")
});
static COUNTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)countr(?:y|ies)").expect("valid country regex"));

static ROAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)road|street|highway|motorway|trunk|transportation|bridge|tunnel|primary|secondary|tertiary|residential|service|track|minor",
    )
    .expect("valid road regex")
});
static MAJOR_ROAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)motorway|trunk|freeway|expressway").expect("valid major road regex"));
static MINOR_ROAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)minor|service|tertiary|residential|living|track").expect("valid minor road regex")
});

static MAJOR_PLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)country|state|capital|city|continent|settlement-major")
        .expect("valid major place regex")
});
static MINOR_PLACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)neighbou?rhood|hamlet").expect("valid minor place regex"));

/// Semantic role of a style layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// Symbol layer (labels and icons).
    Label { major_place: bool },
    /// Administrative boundary line.
    Boundary {
        admin_level: Option<u8>,
        is_country: bool,
    },
    /// Road line. Both flags may be set when a filter spans several classes.
    Road { major: bool, minor: bool },
    BuildingExtrusion,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLayer {
    pub id: String,
    pub role: LayerRole,
}

/// Classification result, in style order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedLayers {
    layers: Vec<ClassifiedLayer>,
}

impl ClassifiedLayers {
    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn role_of(&self, id: &str) -> Option<LayerRole> {
        self.layers.iter().find(|l| l.id == id).map(|l| l.role)
    }

    /// Ids whose role satisfies `pred`, in style order.
    pub fn ids_where(&self, pred: impl Fn(&LayerRole) -> bool) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| pred(&l.role))
            .map(|l| l.id.as_str())
            .collect()
    }

    pub fn count_where(&self, pred: impl Fn(&LayerRole) -> bool) -> usize {
        self.layers.iter().filter(|l| pred(&l.role)).count()
    }
}

/// Classify every layer. Pure: the same input always yields the same roles.
pub fn classify(layers: &[LayerDescriptor]) -> ClassifiedLayers {
    ClassifiedLayers {
        layers: layers
            .iter()
            .map(|l| ClassifiedLayer {
                id: l.id.clone(),
                role: classify_layer(l),
            })
            .collect(),
    }
}

pub fn classify_style(style: &StyleDocument) -> ClassifiedLayers {
    classify(&LayerDescriptor::from_style_layers(&style.layers))
}

pub fn classify_layer(layer: &LayerDescriptor) -> LayerRole {
    let source_layer = layer.source_layer.as_deref().unwrap_or("");
    let filter = layer.filter_text.as_deref().unwrap_or("");

    match layer.render_type {
        RenderType::FillExtrusion => LayerRole::BuildingExtrusion,
        RenderType::Symbol => {
            let major = [layer.id.as_str(), source_layer, filter]
                .iter()
                .any(|t| MAJOR_PLACE_RE.is_match(t));
            let minor = [layer.id.as_str(), source_layer, filter]
                .iter()
                .any(|t| MINOR_PLACE_RE.is_match(t));
            LayerRole::Label {
                major_place: major && !minor,
            }
        }
        RenderType::Line => {
            if is_boundary(&layer.id, source_layer, filter) {
                let admin_level = admin_level(&layer.id, source_layer, filter);
                let is_country = match admin_level {
                    Some(level) => level == 0 || level == 2,
                    None => COUNTRY_RE.is_match(&layer.id) || COUNTRY_RE.is_match(source_layer),
                };
                LayerRole::Boundary {
                    admin_level,
                    is_country,
                }
            } else if ROAD_RE.is_match(&layer.id) || ROAD_RE.is_match(source_layer) {
                LayerRole::Road {
                    major: MAJOR_ROAD_RE.is_match(&layer.id) || MAJOR_ROAD_RE.is_match(filter),
                    minor: MINOR_ROAD_RE.is_match(&layer.id) || MINOR_ROAD_RE.is_match(filter),
                }
            } else {
                LayerRole::Other
            }
        }
        RenderType::Fill | RenderType::Other => LayerRole::Other,
    }
}

fn is_boundary(id: &str, source_layer: &str, filter: &str) -> bool {
    BOUNDARY_RE.is_match(id)
        || BOUNDARY_RE.is_match(source_layer)
        || ADMIN_LEVEL_FILTER_RE.is_match(filter)
}

/// Numeric admin level: id suffix first, then source-layer, then filter.
fn admin_level(id: &str, source_layer: &str, filter: &str) -> Option<u8> {
    let from_name = |text: &str| {
        ADMIN_LEVEL_NAME_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
    };
    from_name(id).or_else(|| from_name(source_layer)).or_else(|| {
        ADMIN_LEVEL_FILTER_RE
            .captures(filter)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbology::Visibility;
    use pretty_assertions::assert_eq;

    fn desc(
        id: &str,
        render_type: RenderType,
        source_layer: Option<&str>,
        filter: Option<&str>,
    ) -> LayerDescriptor {
        LayerDescriptor {
            id: id.to_string(),
            render_type,
            source_layer: source_layer.map(str::to_string),
            filter_text: filter.map(str::to_string),
            has_text_field: render_type == RenderType::Symbol,
            visibility: Visibility::Visible,
        }
    }

    #[test]
    fn boundaries_use_admin_suffix_before_country_keyword() {
        let mapbox = desc("admin-0-boundary", RenderType::Line, Some("admin"), None);
        assert_eq!(
            classify_layer(&mapbox),
            LayerRole::Boundary {
                admin_level: Some(0),
                is_country: true
            }
        );

        let state = desc("admin_1_boundary", RenderType::Line, Some("admin"), None);
        assert_eq!(
            classify_layer(&state),
            LayerRole::Boundary {
                admin_level: Some(1),
                is_country: false
            }
        );

        let keyword = desc("country-border", RenderType::Line, None, None);
        assert_eq!(
            classify_layer(&keyword),
            LayerRole::Boundary {
                admin_level: None,
                is_country: true
            }
        );
    }

    #[test]
    fn boundary_level_falls_back_to_filter() {
        let omt = desc(
            "boundary_state",
            RenderType::Line,
            Some("boundary"),
            Some(r#"["all",["==","admin_level",4]]"#),
        );
        assert_eq!(
            classify_layer(&omt),
            LayerRole::Boundary {
                admin_level: Some(4),
                is_country: false
            }
        );

        let omt_country = desc("boundary_2", RenderType::Line, Some("boundary"), None);
        assert_eq!(
            classify_layer(&omt_country),
            LayerRole::Boundary {
                admin_level: Some(2),
                is_country: true
            }
        );
    }

    #[test]
    fn roads_are_split_into_major_and_minor() {
        let motorway = desc("road-motorway", RenderType::Line, Some("road"), None);
        assert_eq!(
            classify_layer(&motorway),
            LayerRole::Road {
                major: true,
                minor: false
            }
        );

        let service = desc(
            "highway_minor",
            RenderType::Line,
            Some("transportation"),
            Some(r#"["in","class","minor","service","track"]"#),
        );
        assert_eq!(
            classify_layer(&service),
            LayerRole::Road {
                major: false,
                minor: true
            }
        );

        let primary = desc("road-primary", RenderType::Line, Some("road"), None);
        assert_eq!(
            classify_layer(&primary),
            LayerRole::Road {
                major: false,
                minor: false
            }
        );
    }

    #[test]
    fn unrelated_lines_and_fills_are_other() {
        assert_eq!(
            classify_layer(&desc("waterway", RenderType::Line, Some("waterway"), None)),
            LayerRole::Other
        );
        assert_eq!(
            classify_layer(&desc("building", RenderType::Fill, Some("building"), None)),
            LayerRole::Other
        );
        assert_eq!(
            classify_layer(&desc("hillshade", RenderType::Other, None, None)),
            LayerRole::Other
        );
    }

    #[test]
    fn labels_distinguish_major_places() {
        let country = desc("country-label", RenderType::Symbol, Some("place_label"), None);
        let city = desc(
            "place_label_other",
            RenderType::Symbol,
            Some("place"),
            Some(r#"["==","class","city"]"#),
        );
        let hamlet = desc(
            "place-hamlet",
            RenderType::Symbol,
            Some("place"),
            Some(r#"["==","class","hamlet"]"#),
        );
        let poi = desc("poi-label", RenderType::Symbol, Some("poi_label"), None);

        assert_eq!(classify_layer(&country), LayerRole::Label { major_place: true });
        assert_eq!(classify_layer(&city), LayerRole::Label { major_place: true });
        assert_eq!(classify_layer(&hamlet), LayerRole::Label { major_place: false });
        assert_eq!(classify_layer(&poi), LayerRole::Label { major_place: false });
    }

    #[test]
    fn extrusions_are_buildings() {
        let ext = desc("3d-buildings", RenderType::FillExtrusion, Some("building"), None);
        assert_eq!(classify_layer(&ext), LayerRole::BuildingExtrusion);
    }

    #[test]
    fn classification_is_stable() {
        let layers = vec![
            desc("admin-0-boundary", RenderType::Line, Some("admin"), None),
            desc("road-trunk", RenderType::Line, Some("road"), None),
            desc("settlement-major-label", RenderType::Symbol, Some("place_label"), None),
            desc("water", RenderType::Fill, Some("water"), None),
        ];
        let a = classify(&layers);
        let b = classify(&layers);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.role_of("water"), Some(LayerRole::Other));
        assert_eq!(
            a.ids_where(|r| matches!(r, LayerRole::Road { .. })),
            vec!["road-trunk"]
        );
    }
}
