use glam::Vec2;

/// A camera action produced by pointer input.
///
/// Orbit controls consume actions, never raw window events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAction {
    /// Orbit around the target by a pointer delta in pixels.
    Rotate(Vec2),
    /// Slide the target and camera by a pointer delta in pixels.
    Pan(Vec2),
    /// Dolly toward (positive) or away from (negative) the target, in wheel
    /// steps.
    Zoom(f32),
    /// Return to the pose captured when the controls were attached.
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_compare_by_payload() {
        assert_eq!(
            CameraAction::Rotate(Vec2::new(1.0, 2.0)),
            CameraAction::Rotate(Vec2::new(1.0, 2.0))
        );
        assert_ne!(CameraAction::Zoom(1.0), CameraAction::Zoom(-1.0));
        assert!(matches!(CameraAction::Reset, CameraAction::Reset));
    }
}
