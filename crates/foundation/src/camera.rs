use crate::geo::LatLon;

/// Maximum pitch a perspective backend accepts (degrees).
pub const MAX_PITCH_DEG: f64 = 85.0;

/// Full camera pose of a map backend.
///
/// Invariants (enforced by the constructors and setters):
/// - `bearing_deg` is wrapped into `[0, 360)`.
/// - `pitch_deg` is clamped into `[0, MAX_PITCH_DEG]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub center: LatLon,
    pub zoom: f64,
    bearing_deg: f64,
    pitch_deg: f64,
}

impl CameraState {
    pub fn new(center: LatLon, zoom: f64, bearing_deg: f64, pitch_deg: f64) -> Self {
        Self {
            center,
            zoom,
            bearing_deg: wrap_bearing(bearing_deg),
            pitch_deg: clamp_pitch(pitch_deg),
        }
    }

    /// Flat, north-up camera.
    pub fn flat(center: LatLon, zoom: f64) -> Self {
        Self::new(center, zoom, 0.0, 0.0)
    }

    pub fn bearing_deg(&self) -> f64 {
        self.bearing_deg
    }

    pub fn pitch_deg(&self) -> f64 {
        self.pitch_deg
    }

    pub fn with_bearing(mut self, bearing_deg: f64) -> Self {
        self.bearing_deg = wrap_bearing(bearing_deg);
        self
    }

    pub fn with_pitch(mut self, pitch_deg: f64) -> Self {
        self.pitch_deg = clamp_pitch(pitch_deg);
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Equality within `eps`, treating bearings 359.9999 and 0 as equal.
    pub fn approx_eq(&self, other: &CameraState, eps: f64) -> bool {
        let bearing_delta = (self.bearing_deg - other.bearing_deg).rem_euclid(360.0);
        let bearing_delta = bearing_delta.min(360.0 - bearing_delta);
        self.center.approx_eq(&other.center, eps)
            && (self.zoom - other.zoom).abs() <= eps
            && bearing_delta <= eps
            && (self.pitch_deg - other.pitch_deg).abs() <= eps
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::flat(LatLon::default(), 0.0)
    }
}

/// Wrap any finite bearing into `[0, 360)`. Non-finite input maps to north.
pub fn wrap_bearing(bearing_deg: f64) -> f64 {
    if !bearing_deg.is_finite() {
        return 0.0;
    }
    let wrapped = bearing_deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Clamp pitch into `[0, MAX_PITCH_DEG]`. Non-finite input maps to flat.
pub fn clamp_pitch(pitch_deg: f64) -> f64 {
    if !pitch_deg.is_finite() {
        return 0.0;
    }
    pitch_deg.clamp(0.0, MAX_PITCH_DEG)
}
