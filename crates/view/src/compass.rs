//! Compass readout for the 3D view.

use foundation::{CameraState, wrap_bearing};

/// Arrow state of the on-screen compass. The host polls the active backend's
/// bearing while the compass is shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compass {
    visible: bool,
    arrow_deg: f64,
}

impl Compass {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Rotation applied to the arrow so it keeps pointing north.
    pub fn arrow_deg(&self) -> f64 {
        self.arrow_deg
    }

    /// Returns `false` when already visible.
    pub fn show(&mut self) -> bool {
        !std::mem::replace(&mut self.visible, true)
    }

    /// Hiding also resets the arrow. Returns `false` when already hidden.
    pub fn hide(&mut self) -> bool {
        self.arrow_deg = 0.0;
        std::mem::replace(&mut self.visible, false)
    }

    /// Feed one bearing sample. Returns the new arrow rotation when it moved.
    pub fn poll(&mut self, bearing_deg: f64) -> Option<f64> {
        if !self.visible {
            return None;
        }
        let arrow = -wrap_bearing(bearing_deg);
        if (arrow - self.arrow_deg).abs() < 1e-9 {
            return None;
        }
        self.arrow_deg = arrow;
        Some(arrow)
    }
}

/// Camera target of "reset to north": same place and zoom, due north, tilted.
pub fn north_up(camera: &CameraState, pitch_deg: f64) -> CameraState {
    camera.with_bearing(0.0).with_pitch(pitch_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::LatLon;

    #[test]
    fn arrow_counter_rotates_bearing() {
        let mut c = Compass::default();
        assert_eq!(c.poll(30.0), None);
        assert!(c.show());
        assert!(!c.show());
        assert_eq!(c.poll(30.0), Some(-30.0));
        assert_eq!(c.poll(30.0), None);
        assert_eq!(c.poll(-90.0), Some(-270.0));
    }

    #[test]
    fn hide_resets_arrow() {
        let mut c = Compass::default();
        c.show();
        c.poll(45.0);
        assert!(c.hide());
        assert_eq!(c.arrow_deg(), 0.0);
        assert!(!c.hide());
    }

    #[test]
    fn north_up_keeps_position() {
        let cam = CameraState::new(LatLon::new(47.8, 13.0), 16.0, 120.0, 20.0);
        let target = north_up(&cam, 60.0);
        assert_eq!(target.bearing_deg(), 0.0);
        assert_eq!(target.pitch_deg(), 60.0);
        assert_eq!(target.center, cam.center);
        assert_eq!(target.zoom, 16.0);
    }
}
