//! Shared types for the orbitlight workspace: node identity, transforms,
//! angle helpers.

pub mod angle;
pub mod types;

pub use angle::deg_to_rad;
pub use types::{NodeId, Transform};
