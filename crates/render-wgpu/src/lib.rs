//! wgpu render backend for the orbit light scene.
//!
//! Draws every mesh instanced per geometry, lit by the scene's first rect
//! area light plus ambient, and overlays light helpers as lines.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Depth buffer always matches the last size passed to `resize`.
//! - Single-sided materials hide back faces; double-sided ones flip the
//!   normal instead.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
