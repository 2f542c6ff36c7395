//! Rendering Adapter: camera, orbit controls and the renderer-agnostic pass
//! pipeline.
//!
//! # Invariants
//! - Renderers read the scene graph; they never mutate it.
//! - The camera is only moved by a `CameraController`.
//! - The pass list is fixed once the pipeline is built.
//!
//! A `DebugTextRenderer` implements the `Renderer` trait without a GPU for the
//! CLI and tests; the wgpu backend lives in `roadscene-render-wgpu`.

mod camera;
mod controls;
mod pipeline;
mod renderer;

pub use camera::PerspectiveCamera;
pub use controls::{CameraController, OrbitControls, OrbitSettings};
pub use pipeline::{BloomSettings, PassDescriptor, RenderPipeline};
pub use renderer::{DebugTextRenderer, Renderer};
