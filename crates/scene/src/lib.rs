//! Scene Graph Store: the objects, materials, textures and light of one scene.
//!
//! # Invariants
//! - Objects are never removed; every inserted id stays valid for the session.
//! - Iteration follows insertion order.
//! - After insertion, material tint/replace is the only mutation applied from
//!   outside the frame driver's transform step.
//! - Materials are shared by handle: tinting a material is visible on every
//!   object holding it.

pub mod geometry;
pub mod graph;
pub mod material;
pub mod ray;

pub use geometry::{Geometry, TriangleMesh};
pub use graph::{Paintable, SceneEvent, SceneGraph, SceneObject};
pub use material::{Light, Material, MaterialKind, Texture};
pub use ray::{Intersection, Ray};
