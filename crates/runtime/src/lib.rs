//! Scene runtime: the explicit context shared by the frame driver and the
//! picking controller.
//!
//! # Invariants
//! - One camera and one render pipeline per `SceneContext`.
//! - Frame ticks and click handling run on the same thread, one at a time.
//! - The run loop ends only when its `Session` is ended.

pub mod config;
pub mod context;
pub mod frame;
pub mod picking;

pub use config::{ConfigError, SceneConfig};
pub use context::{SceneContext, load_road_texture};
pub use frame::{FrameDriver, Session};
pub use picking::{PickOutcome, PickingController};
