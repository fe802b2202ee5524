//! Orbit controls: pointer input mapped to camera actions around a target.
//!
//! # Invariants
//! - Hosts translate raw window events into `PointerTracker` calls; nothing
//!   here depends on a windowing crate.
//! - Orbiting never changes the camera's distance to its target.

pub mod action;
pub mod orbit;
pub mod pointer;

pub use action::CameraAction;
pub use orbit::OrbitControls;
pub use pointer::{PointerButton, PointerTracker};
