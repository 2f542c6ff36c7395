//! Pointer input mapped to high-level scene actions.
//!
//! # Invariants
//! - Consumers react to `Action`s, never to raw window events.
//! - Device coordinates span `[-1, 1]` on both axes with +Y up.

pub mod action;
pub mod pointer;

pub use action::{Action, PointerButton, PointerTracker};
pub use pointer::{ScreenPoint, Viewport};
