use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees (WGS84).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl LatLon {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite()
    }

    /// Component-wise comparison with an absolute tolerance in degrees.
    pub fn approx_eq(&self, other: &LatLon, eps: f64) -> bool {
        (self.lat_deg - other.lat_deg).abs() <= eps && (self.lon_deg - other.lon_deg).abs() <= eps
    }
}

impl Default for LatLon {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
