//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene graph and camera; they never mutate them.
//! - Surface size is pushed to the renderer through `Renderer::resize`.
//!
//! The wgpu backend lives in `orbitlight-render-wgpu`. The debug text
//! renderer here serves the headless CLI and tests.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};
