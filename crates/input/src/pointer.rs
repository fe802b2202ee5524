use crate::action::CameraAction;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Turns pointer button, motion and wheel events into camera actions.
///
/// Primary drag rotates, secondary or middle drag pans, the wheel zooms.
#[derive(Debug, Default)]
pub struct PointerTracker {
    rotating: bool,
    panning: bool,
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        match button {
            PointerButton::Primary => self.rotating = pressed,
            PointerButton::Secondary | PointerButton::Middle => self.panning = pressed,
        }
    }

    /// Record a new pointer position. Returns an action while a drag is active.
    pub fn moved(&mut self, position: Vec2) -> Option<CameraAction> {
        let last = self.last.replace(position)?;
        let delta = position - last;
        if delta == Vec2::ZERO {
            return None;
        }
        if self.rotating {
            Some(CameraAction::Rotate(delta))
        } else if self.panning {
            Some(CameraAction::Pan(delta))
        } else {
            None
        }
    }

    pub fn wheel(&mut self, steps: f32) -> CameraAction {
        CameraAction::Zoom(steps)
    }

    /// Forget the last position, e.g. when the pointer leaves the surface.
    pub fn leave(&mut self) {
        self.last = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.rotating || self.panning
    }
}
