//! Shared value types used across the roadscene crates.
//!
//! # Invariants
//! - Identifiers are plain copyable handles; ownership of the data they name
//!   lives in the scene graph.

mod types;

pub use types::{Color, MaterialId, ObjectId, TextureId, Transform};
