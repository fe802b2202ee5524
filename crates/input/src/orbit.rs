use crate::action::CameraAction;
use glam::{Vec2, Vec3};
use orbitlight_scene::PerspectiveCamera;
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle off the poles so `look_at` never degenerates.
const POLAR_EPSILON: f32 = 1e-4;

/// Orbit camera controller: spherical coordinates of the camera around a
/// target point.
///
/// Rotation is measured like a turntable. A drag across the full viewport
/// height turns the camera once around the target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub rotate_speed: f32,
    /// Distance multiplier per wheel step toward the target.
    pub zoom_scale: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    viewport_height: f32,
    home: (Vec3, Vec3),
}

impl OrbitControls {
    /// Bind to a camera's current pose. The camera's target becomes the orbit
    /// center.
    pub fn attach(camera: &PerspectiveCamera, viewport_height: u32) -> Self {
        let target = camera.target();
        let mut controls = Self {
            target,
            rotate_speed: 1.0,
            zoom_scale: 0.95,
            pan_speed: 1.0,
            min_distance: 0.5,
            max_distance: 90.0,
            radius: 1.0,
            theta: 0.0,
            phi: PI / 2.0,
            viewport_height: viewport_height.max(1) as f32,
            home: (target, camera.position),
        };
        controls.capture(camera.position - target);
        controls
    }

    fn capture(&mut self, offset: Vec3) {
        self.radius = offset.length().max(f32::EPSILON);
        self.theta = offset.x.atan2(offset.z);
        self.phi = (offset.y / self.radius)
            .clamp(-1.0, 1.0)
            .acos()
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Current camera distance from the target.
    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn apply(&mut self, camera: &mut PerspectiveCamera, action: CameraAction) {
        match action {
            CameraAction::Rotate(delta) => self.rotate(delta),
            CameraAction::Pan(delta) => self.pan(camera, delta),
            CameraAction::Zoom(steps) => self.zoom(steps),
            CameraAction::Reset => {
                let (target, position) = self.home;
                self.target = target;
                self.capture(position - target);
                tracing::debug!("orbit controls reset");
            }
        }
        self.sync(camera);
    }

    fn rotate(&mut self, delta: Vec2) {
        let scale = TAU / self.viewport_height * self.rotate_speed;
        self.theta -= delta.x * scale;
        self.phi = (self.phi - delta.y * scale).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    }

    fn zoom(&mut self, steps: f32) {
        self.radius = (self.radius * self.zoom_scale.powf(steps))
            .clamp(self.min_distance, self.max_distance);
    }

    fn pan(&mut self, camera: &PerspectiveCamera, delta: Vec2) {
        // World units covered by one pixel at the target's depth.
        let half_height = self.radius * (camera.fov_degrees.to_radians() * 0.5).tan();
        let per_pixel = 2.0 * half_height / self.viewport_height * self.pan_speed;
        let right = camera.right();
        let up = right.cross(camera.forward());
        self.target += (-right * delta.x + up * delta.y) * per_pixel;
    }

    /// Position the camera from the spherical state and aim it at the target.
    pub fn sync(&self, camera: &mut PerspectiveCamera) {
        let offset = Vec3::new(
            self.radius * self.phi.sin() * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(75.0, 4.0 / 3.0, 0.1, 100.0);
        cam.position = Vec3::new(7.0, 7.0, 0.0);
        cam.look_at(Vec3::ZERO);
        cam
    }

    #[test]
    fn attach_and_sync_preserve_pose() {
        let mut cam = camera();
        let controls = OrbitControls::attach(&cam, 600);
        controls.sync(&mut cam);
        assert!(cam.position.abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-4));
        assert!((controls.distance() - 98f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn rotation_keeps_distance() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        let before = cam.position.distance(controls.target);
        controls.apply(&mut cam, CameraAction::Rotate(Vec2::new(120.0, -40.0)));
        let after = cam.position.distance(controls.target);
        assert!((before - after).abs() < 1e-4);
        assert!(!cam.position.abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-3));
        assert_eq!(cam.target(), controls.target);
    }

    #[test]
    fn full_height_drag_turns_once_around() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        controls.apply(&mut cam, CameraAction::Rotate(Vec2::new(600.0, 0.0)));
        assert!(cam.position.abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-3));
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        controls.apply(&mut cam, CameraAction::Rotate(Vec2::new(0.0, 10_000.0)));
        assert!(cam.position.y > 0.0);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn zoom_clamps_to_limits() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        controls.apply(&mut cam, CameraAction::Zoom(1.0));
        assert!(controls.distance() < 98f32.sqrt());
        controls.apply(&mut cam, CameraAction::Zoom(500.0));
        assert_eq!(controls.distance(), controls.min_distance);
        controls.apply(&mut cam, CameraAction::Zoom(-500.0));
        assert_eq!(controls.distance(), controls.max_distance);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        let offset_before = cam.position - controls.target;
        controls.apply(&mut cam, CameraAction::Pan(Vec2::new(50.0, 20.0)));
        assert_ne!(controls.target, Vec3::ZERO);
        let offset_after = cam.position - controls.target;
        assert!(offset_before.abs_diff_eq(offset_after, 1e-4));
    }

    #[test]
    fn reset_restores_home_pose() {
        let mut cam = camera();
        let mut controls = OrbitControls::attach(&cam, 600);
        controls.apply(&mut cam, CameraAction::Rotate(Vec2::new(80.0, 30.0)));
        controls.apply(&mut cam, CameraAction::Pan(Vec2::new(10.0, 10.0)));
        controls.apply(&mut cam, CameraAction::Zoom(3.0));
        controls.apply(&mut cam, CameraAction::Reset);
        assert_eq!(controls.target, Vec3::ZERO);
        assert!(cam.position.abs_diff_eq(Vec3::new(7.0, 7.0, 0.0), 1e-4));
    }
}
