//! Scene application: owns the scene, camera, area light and animation state,
//! and drives them once per frame.
//!
//! # Invariants
//! - The animated pivot's rotation is a pure function of the frame timestamp.
//! - After every update the light target equals the orbiting sphere's world
//!   position for that timestamp.
//! - Camera aspect and renderer size follow the latest resize.
//! - Ring pivots are written once at setup and never again.

pub mod app;
pub mod config;
pub mod frame;

pub use app::{RING_COUNT, SceneApp, Viewport, pivot_angle};
pub use config::{AnimationConfig, CameraConfig, ConfigError, FrameOrder, LightConfig, SceneConfig};
pub use frame::{
    CancelToken, ClockScheduler, FixedStepScheduler, FrameScheduler, LoopStats, StopReason, run_loop,
};
