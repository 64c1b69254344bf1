//! GeoJSON loading and the attraction filter.

use foundation::LatLon;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum PoiError {
    #[error("invalid POI JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a FeatureCollection, found `{0}`")]
    NotFeatureCollection(String),
}

/// Which features become markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiFilter {
    pub tourism: String,
    pub require_image: bool,
    pub require_description: bool,
    pub exclude_ruins: bool,
}

impl Default for PoiFilter {
    fn default() -> Self {
        Self {
            tourism: "attraction".to_string(),
            require_image: true,
            require_description: true,
            exclude_ruins: true,
        }
    }
}

const IMAGE_KEY: &str = "img_file";
const DESCRIPTION_KEY: &str = "description-translated";

impl PoiFilter {
    pub fn accepts(&self, props: &Map<String, Value>) -> bool {
        let is_attraction = props.get("tourism").and_then(Value::as_str) == Some(self.tourism.as_str());
        let has_image = !self.require_image || has_value(props, IMAGE_KEY);
        let has_description = !self.require_description || has_value(props, DESCRIPTION_KEY);
        // Untagged ruins count as "not a ruin".
        let not_ruin = !self.exclude_ruins
            || match props.get("ruins") {
                None | Some(Value::Null) => true,
                Some(v) => v.as_str() == Some("no"),
            };
        is_attraction && has_image && has_description && not_ruin
    }
}

fn has_value(props: &Map<String, Value>, key: &str) -> bool {
    !matches!(props.get(key), None | Some(Value::Null))
}

/// One accepted point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiRecord {
    pub position: LatLon,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl RawGeometry {
    /// GeoJSON points are `[lon, lat]`.
    fn point(&self) -> Option<LatLon> {
        if self.kind != "Point" {
            return None;
        }
        let coords = self.coordinates.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        let pos = LatLon::new(lat, lon);
        pos.is_finite().then_some(pos)
    }
}

/// Outcome of loading a POI file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiLoad {
    pub records: Vec<PoiRecord>,
    pub total_features: usize,
    pub filtered_out: usize,
    pub skipped_geometry: usize,
}

pub fn parse_pois(json: &str, filter: &PoiFilter) -> Result<PoiLoad, PoiError> {
    let raw: RawCollection = serde_json::from_str(json)?;
    if raw.kind != "FeatureCollection" {
        return Err(PoiError::NotFeatureCollection(raw.kind));
    }

    let mut load = PoiLoad {
        total_features: raw.features.len(),
        ..PoiLoad::default()
    };
    let empty = Map::new();
    for feature in &raw.features {
        let props = feature.properties.as_ref().unwrap_or(&empty);
        if !filter.accepts(props) {
            load.filtered_out += 1;
            continue;
        }
        let Some(position) = feature.geometry.as_ref().and_then(RawGeometry::point) else {
            load.skipped_geometry += 1;
            continue;
        };
        load.records.push(PoiRecord {
            position,
            title: string_prop(props, "name").unwrap_or_default(),
            description: string_prop(props, DESCRIPTION_KEY),
            image: string_prop(props, IMAGE_KEY),
        });
    }

    tracing::debug!(
        kept = load.records.len(),
        filtered = load.filtered_out,
        skipped = load.skipped_geometry,
        "loaded POIs"
    );
    Ok(load)
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}
