//! Modifier-gated keyboard and pointer navigation for the 3D view.
//!
//! Input is only consumed while Shift or Alt is held; everything else falls
//! through to the backend's own pan handling.

use foundation::{CameraState, clamp_pitch};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    /// DOM `KeyboardEvent.key` names.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(ArrowKey::Left),
            "ArrowRight" => Some(ArrowKey::Right),
            "ArrowUp" => Some(ArrowKey::Up),
            "ArrowDown" => Some(ArrowKey::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn engaged(self) -> bool {
        self.shift || self.alt
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NavigationSettings {
    pub key_step_deg: f64,
    pub drag_bearing_deg_per_px: f64,
    pub drag_pitch_deg_per_px: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Drag {
    pointer_id: i32,
    last_x: f64,
    last_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    settings: NavigationSettings,
    attached: bool,
    drag: Option<Drag>,
}

impl Navigation {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            settings,
            attached: false,
            drag: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns `false` when already attached.
    pub fn attach(&mut self) -> bool {
        !std::mem::replace(&mut self.attached, true)
    }

    /// Drops any drag in progress. Returns `false` when already detached.
    pub fn detach(&mut self) -> bool {
        self.drag = None;
        std::mem::replace(&mut self.attached, false)
    }

    /// Camera after one arrow press, or `None` when the key is not ours.
    pub fn key(&self, camera: &CameraState, key: ArrowKey, mods: Modifiers) -> Option<CameraState> {
        if !self.attached || !mods.engaged() {
            return None;
        }
        let step = self.settings.key_step_deg;
        let next = match key {
            ArrowKey::Left => camera.with_bearing(camera.bearing_deg() - step),
            ArrowKey::Right => camera.with_bearing(camera.bearing_deg() + step),
            ArrowKey::Up => camera.with_pitch(clamp_pitch(camera.pitch_deg() + step)),
            ArrowKey::Down => camera.with_pitch(clamp_pitch(camera.pitch_deg() - step)),
        };
        Some(next)
    }

    /// Start a drag. `true` means the host should capture the pointer and
    /// suppress the backend's pan for this gesture.
    pub fn pointer_down(&mut self, pointer_id: i32, x: f64, y: f64, mods: Modifiers) -> bool {
        if !self.attached || !mods.engaged() {
            return false;
        }
        self.drag = Some(Drag {
            pointer_id,
            last_x: x,
            last_y: y,
        });
        true
    }

    /// Camera after a drag step. Dragging right turns the bearing clockwise,
    /// dragging up tilts further.
    pub fn pointer_move(&mut self, camera: &CameraState, pointer_id: i32, x: f64, y: f64) -> Option<CameraState> {
        let drag = self.drag.as_mut().filter(|d| d.pointer_id == pointer_id)?;
        let dx = x - drag.last_x;
        let dy = y - drag.last_y;
        drag.last_x = x;
        drag.last_y = y;
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        let bearing = camera.bearing_deg() + dx * self.settings.drag_bearing_deg_per_px;
        let pitch = clamp_pitch(camera.pitch_deg() - dy * self.settings.drag_pitch_deg_per_px);
        Some(camera.with_bearing(bearing).with_pitch(pitch))
    }

    /// End a drag. Returns whether the pointer belonged to our drag.
    pub fn pointer_up(&mut self, pointer_id: i32) -> bool {
        match self.drag {
            Some(d) if d.pointer_id == pointer_id => {
                self.drag = None;
                true
            }
            _ => false,
        }
    }
}
