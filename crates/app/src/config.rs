use glam::Vec3;
use orbitlight_scene::{Color, SceneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Errors from loading or validating a scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config format {0:?}: expected .json, .yaml or .yml")]
    UnsupportedFormat(String),
    #[error("unknown frame order {0:?}: expected update-then-draw or draw-then-update")]
    UnknownFrameOrder(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Whether a frame draws before or after its own update.
///
/// `DrawThenUpdate` shows each frame with the previous frame's state, so the
/// visible light aim trails the sphere by one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameOrder {
    #[default]
    UpdateThenDraw,
    DrawThenUpdate,
}

impl FromStr for FrameOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update-then-draw" => Ok(Self::UpdateThenDraw),
            "draw-then-update" => Ok(Self::DrawThenUpdate),
            other => Err(ConfigError::UnknownFrameOrder(other.to_string())),
        }
    }
}

impl fmt::Display for FrameOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UpdateThenDraw => "update-then-draw",
            Self::DrawThenUpdate => "draw-then-update",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(7.0, 7.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: Color,
    pub intensity: f32,
    pub width: f32,
    pub height: f32,
    pub position: Vec3,
    /// Turn the light to face its target every frame. Off by default: the
    /// light keeps its downward orientation and only the target moves.
    pub turn_to_target: bool,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 10.0,
            width: 6.0,
            height: 1.0,
            position: Vec3::new(0.0, 5.0, 0.0),
            turn_to_target: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Orbit speed of the small sphere's pivot.
    pub degrees_per_second: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            degrees_per_second: 50.0,
        }
    }
}

/// Scene configuration. Every field has a default, so an empty file is a
/// valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub animation: AnimationConfig,
    pub frame_order: FrameOrder,
    pub show_helper: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            animation: AnimationConfig::default(),
            frame_order: FrameOrder::default(),
            show_helper: true,
        }
    }
}

impl SceneConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = match ext.as_str() {
            "json" | "yaml" | "yml" => std::fs::read_to_string(path)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        let config: Self = if ext == "json" {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                cam.fov_degrees
            )));
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if !cam.position.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "camera.position must be finite, got {}",
                cam.position
            )));
        }
        let light = &self.light;
        if !(light.width > 0.0 && light.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "light size must be positive, got {}x{}",
                light.width, light.height
            )));
        }
        if !(light.intensity >= 0.0 && light.intensity.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "light.intensity must be finite and non-negative, got {}",
                light.intensity
            )));
        }
        if !light.position.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "light.position must be finite, got {}",
                light.position
            )));
        }
        if !self.animation.degrees_per_second.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "animation.degrees_per_second must be finite, got {}",
                self.animation.degrees_per_second
            )));
        }
        Ok(())
    }
}
