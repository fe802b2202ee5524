use crate::material::Color;
use glam::{Mat4, Quat, Vec3};

/// Number of line segments a [`RectAreaLightHelper`] draws: four rectangle
/// edges plus the aim line.
pub const HELPER_SEGMENTS: usize = 5;

/// Proof that the area-light shading tables were set up.
///
/// Rect area lights need one-time lighting setup before the first light
/// exists; [`RectAreaLight::new`] takes this token.
#[derive(Debug)]
pub struct AreaLightSupport {
    _private: (),
}

impl AreaLightSupport {
    pub fn init() -> Self {
        tracing::debug!("rect area light support initialized");
        Self { _private: () }
    }
}

/// Rectangular area light. Emits from its local -Z face.
#[derive(Debug, Clone, PartialEq)]
pub struct RectAreaLight {
    pub color: Color,
    pub intensity: f32,
    pub width: f32,
    pub height: f32,
    target: Vec3,
}

impl RectAreaLight {
    pub fn new(
        _support: &AreaLightSupport,
        color: Color,
        intensity: f32,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            color,
            intensity,
            width,
            height,
            target: Vec3::ZERO,
        }
    }

    /// World-space point the light is aimed at.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Rotation turning the emitting face at `position` toward `target`.
    /// `None` when the two points coincide.
    pub fn aim_rotation(position: Vec3, target: Vec3) -> Option<Quat> {
        let dir = (target - position).try_normalize()?;
        Some(Quat::from_rotation_arc(Vec3::NEG_Z, dir))
    }

    /// Corners of the rectangle in the light's local frame, counter-clockwise.
    pub fn local_corners(&self) -> [Vec3; 4] {
        let (hw, hh) = (self.width * 0.5, self.height * 0.5);
        [
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ]
    }
}

/// Debug outline of a rect area light and its aim.
///
/// Holds world-space segments, so it has to be refreshed with
/// [`RectAreaLightHelper::update`] whenever the light moves, turns, or is
/// re-targeted.
#[derive(Debug, Clone, PartialEq)]
pub struct RectAreaLightHelper {
    segments: [(Vec3, Vec3); HELPER_SEGMENTS],
    color: Color,
    revision: u64,
}

impl RectAreaLightHelper {
    pub fn new(light: &RectAreaLight, light_world: Mat4) -> Self {
        let mut helper = Self {
            segments: [(Vec3::ZERO, Vec3::ZERO); HELPER_SEGMENTS],
            color: light.color,
            revision: 0,
        };
        helper.rebuild(light, light_world);
        helper
    }

    /// Recompute segments from the light's current shape, pose and target.
    pub fn update(&mut self, light: &RectAreaLight, light_world: Mat4) {
        self.rebuild(light, light_world);
        self.revision += 1;
    }

    fn rebuild(&mut self, light: &RectAreaLight, light_world: Mat4) {
        let corners = light.local_corners().map(|c| light_world.transform_point3(c));
        for i in 0..4 {
            self.segments[i] = (corners[i], corners[(i + 1) % 4]);
        }
        let center = light_world.transform_point3(Vec3::ZERO);
        self.segments[4] = (center, light.target());
        self.color = light.color;
    }

    pub fn segments(&self) -> &[(Vec3, Vec3); HELPER_SEGMENTS] {
        &self.segments
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Number of refreshes since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
