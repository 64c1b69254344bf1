//! [`MapBackend`] over a mapbox-gl `Map` object handed in from the page.

use foundation::{CameraState, LatLon};
use js_sys::{Array, Function, JSON, Object, Reflect};
use layers::{StyleDocument, StyleLayer, Visibility, parse_style_str};
use view::{BackendError, Interaction, MapBackend};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

fn host(err: JsValue) -> BackendError {
    BackendError::Host(
        err.as_string()
            .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
            .unwrap_or_else(|| format!("{err:?}")),
    )
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, BackendError> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(host)
}

fn set(target: &Object, key: &str, value: JsValue) -> Result<(), BackendError> {
    Reflect::set(target, &JsValue::from_str(key), &value)
        .map(|_| ())
        .map_err(host)
}

fn number(value: JsValue, what: &str) -> Result<f64, BackendError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BackendError::Host(format!("{what} is not a number")))
}

#[derive(Debug, Clone)]
pub struct JsBackend {
    map: JsValue,
}

impl JsBackend {
    pub fn new(map: JsValue) -> Result<Self, JsValue> {
        if !map.is_object() {
            return Err(JsValue::from_str("map must be an object"));
        }
        Ok(Self { map })
    }

    fn method(&self, name: &str) -> Result<Function, BackendError> {
        get(&self.map, name)?
            .dyn_into::<Function>()
            .map_err(|_| BackendError::Host(format!("map.{name} is not a function")))
    }

    fn call0(&self, name: &str) -> Result<JsValue, BackendError> {
        self.method(name)?.call0(&self.map).map_err(host)
    }

    fn call1(&self, name: &str, a: &JsValue) -> Result<JsValue, BackendError> {
        self.method(name)?.call1(&self.map, a).map_err(host)
    }

    fn camera_options(camera: &CameraState) -> Result<Object, BackendError> {
        let opts = Object::new();
        let center = Array::of2(
            &JsValue::from_f64(camera.center.lon_deg),
            &JsValue::from_f64(camera.center.lat_deg),
        );
        set(&opts, "center", center.into())?;
        set(&opts, "zoom", JsValue::from_f64(camera.zoom))?;
        set(&opts, "bearing", JsValue::from_f64(camera.bearing_deg()))?;
        set(&opts, "pitch", JsValue::from_f64(camera.pitch_deg()))?;
        Ok(opts)
    }
}

impl MapBackend for JsBackend {
    fn camera(&self) -> Result<CameraState, BackendError> {
        let center = self.call0("getCenter")?;
        let lat = number(get(&center, "lat")?, "center.lat")?;
        let lon = number(get(&center, "lng")?, "center.lng")?;
        let zoom = number(self.call0("getZoom")?, "zoom")?;
        let bearing = number(self.call0("getBearing")?, "bearing")?;
        let pitch = number(self.call0("getPitch")?, "pitch")?;
        Ok(CameraState::new(LatLon::new(lat, lon), zoom, bearing, pitch))
    }

    fn jump_to(&mut self, camera: &CameraState) -> Result<(), BackendError> {
        let opts = Self::camera_options(camera)?;
        self.call1("jumpTo", &opts.into()).map(|_| ())
    }

    fn ease_to(&mut self, camera: &CameraState, duration_ms: u64) -> Result<(), BackendError> {
        let opts = Self::camera_options(camera)?;
        set(&opts, "duration", JsValue::from_f64(duration_ms as f64))?;
        self.call1("easeTo", &opts.into()).map(|_| ())
    }

    fn is_style_loaded(&self) -> bool {
        self.call0("isStyleLoaded")
            .map(|v| v.as_bool().unwrap_or(false))
            .unwrap_or(false)
    }

    fn style(&self) -> Result<StyleDocument, BackendError> {
        if !self.is_style_loaded() {
            return Err(BackendError::StyleNotLoaded);
        }
        let style = self.call0("getStyle")?;
        let text: String = JSON::stringify(&style).map_err(host)?.into();
        Ok(parse_style_str(&text)?)
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<(), BackendError> {
        self.method("setLayoutProperty")?
            .call3(
                &self.map,
                &JsValue::from_str(layer_id),
                &JsValue::from_str("visibility"),
                &JsValue::from_str(visibility.as_str()),
            )
            .map(|_| ())
            .map_err(|e| BackendError::Rejected {
                layer: layer_id.to_string(),
                reason: host(e).to_string(),
            })
    }

    fn add_layer(&mut self, layer: &StyleLayer, before: Option<&str>) -> Result<(), BackendError> {
        if self.call1("getLayer", &JsValue::from_str(&layer.id))?.is_truthy() {
            return Err(BackendError::DuplicateLayer(layer.id.clone()));
        }
        let json = serde_json::to_string(layer).map_err(|e| BackendError::Style(e.to_string()))?;
        let value = JSON::parse(&json).map_err(host)?;
        let before = before.map(JsValue::from_str).unwrap_or(JsValue::UNDEFINED);
        self.method("addLayer")?
            .call2(&self.map, &value, &before)
            .map(|_| ())
            .map_err(host)
    }

    fn remove_layer(&mut self, layer_id: &str) -> Result<(), BackendError> {
        let id = JsValue::from_str(layer_id);
        if !self.call1("getLayer", &id)?.is_truthy() {
            return Err(BackendError::UnknownLayer(layer_id.to_string()));
        }
        self.call1("removeLayer", &id).map(|_| ())
    }

    fn set_interaction(&mut self, interaction: Interaction, enabled: bool) -> Result<(), BackendError> {
        let handler = get(&self.map, interaction.as_str())?;
        if handler.is_undefined() || handler.is_null() {
            return Err(BackendError::Host(format!(
                "map has no `{}` handler",
                interaction.as_str()
            )));
        }
        let toggle = get(&handler, if enabled { "enable" } else { "disable" })?
            .dyn_into::<Function>()
            .map_err(|_| BackendError::Host(format!("{} cannot be toggled", interaction.as_str())))?;
        toggle.call0(&handler).map(|_| ()).map_err(host)
    }

    fn canvas_data_url(&self) -> Result<String, BackendError> {
        let canvas = self
            .call0("getCanvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| BackendError::Host("getCanvas did not return a canvas".to_string()))?;
        canvas.to_data_url_with_type("image/png").map_err(host)
    }
}
