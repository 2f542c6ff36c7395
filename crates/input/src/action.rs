use crate::pointer::{ScreenPoint, Viewport};

/// A high-level action produced from raw pointer and window input.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Primary click released at a screen position.
    Click(ScreenPoint),
    /// Orbit the camera by a pixel delta.
    Orbit { dx: f32, dy: f32 },
    /// Pan the camera by a pixel delta.
    Pan { dx: f32, dy: f32 },
    /// Zoom by wheel lines; positive zooms in.
    Zoom(f32),
    /// The drawable area changed size.
    Resize(Viewport),
    /// Input that maps to nothing.
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Turns cursor motion and button state into `Action`s.
///
/// A primary release always produces a `Click`, even after a drag, the way
/// browsers fire `click` after a mousedown/mouseup pair.
#[derive(Debug, Default)]
pub struct PointerTracker {
    cursor: ScreenPoint,
    primary_held: bool,
    secondary_held: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> ScreenPoint {
        self.cursor
    }

    pub fn cursor_moved(&mut self, to: ScreenPoint) -> Action {
        let dx = to.x - self.cursor.x;
        let dy = to.y - self.cursor.y;
        self.cursor = to;
        if self.primary_held {
            Action::Orbit { dx, dy }
        } else if self.secondary_held {
            Action::Pan { dx, dy }
        } else {
            Action::Noop
        }
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) -> Action {
        match button {
            PointerButton::Primary => {
                let was_held = self.primary_held;
                self.primary_held = pressed;
                if was_held && !pressed {
                    tracing::trace!("click at ({:.0}, {:.0})", self.cursor.x, self.cursor.y);
                    Action::Click(self.cursor)
                } else {
                    Action::Noop
                }
            }
            PointerButton::Secondary => {
                self.secondary_held = pressed;
                Action::Noop
            }
            PointerButton::Other => Action::Noop,
        }
    }

    pub fn wheel(&mut self, lines: f32) -> Action {
        if lines == 0.0 {
            Action::Noop
        } else {
            Action::Zoom(lines)
        }
    }
}
