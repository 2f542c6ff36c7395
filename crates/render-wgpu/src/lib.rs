//! wgpu render backend for the road scene.
//!
//! Draws every scene object with its material into an HDR target, then runs
//! the bloom chain (bright extract, separable blur, additive composite) onto
//! the window surface.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Geometry is uploaded once per object; materials are re-read every frame,
//!   so tint and material swaps show up on the next frame.
//! - All render targets follow the surface size.

mod bloom;
mod gpu;
mod shaders;
mod surface;

pub use bloom::{BloomPass, HDR_FORMAT};
pub use gpu::WgpuRenderer;
pub use surface::{GpuError, SurfaceRenderer};
