//! Scene layer: node hierarchy, geometry primitives, standard materials,
//! perspective camera and rectangular area lights.
//!
//! # Invariants
//! - Nodes live in a BTreeMap keyed by `NodeId`; traversal follows root and
//!   child insertion order, never map order.
//! - World transforms are always derived from the parent chain on demand;
//!   nothing caches a world matrix that could go stale.
//! - A `RectAreaLight` can only be built after `AreaLightSupport::init()`.

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;

pub use camera::PerspectiveCamera;
pub use geometry::{Geometry, GeometryHandle, MeshData};
pub use graph::{Mesh, Node, NodeKind, SceneGraph};
pub use light::{AreaLightSupport, HELPER_SEGMENTS, RectAreaLight, RectAreaLightHelper};
pub use material::{Color, MaterialHandle, Side, StandardMaterial};

use orbitlight_common::NodeId;

/// Errors from scene construction.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
    #[error("unknown geometry handle {0:?}")]
    UnknownGeometry(GeometryHandle),
    #[error("unknown material handle {0:?}")]
    UnknownMaterial(MaterialHandle),
}
