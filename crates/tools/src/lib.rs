//! Developer tooling: scene inspector for overlays and the CLI.
//!
//! # Invariants
//! - Tools only read the scene graph.

pub mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
