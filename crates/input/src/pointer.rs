use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Cursor position in window pixels, origin top-left, Y down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Drawable area size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl Viewport {
    /// A zero dimension is clamped to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    /// Map a screen point to device space. Y is inverted because screen Y
    /// grows downward while device Y grows upward.
    pub fn to_ndc(&self, point: ScreenPoint) -> Vec2 {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        Vec2::new(2.0 * point.x / w - 1.0, -(2.0 * point.y / h - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2, tol: f32) -> bool {
        (a - b).abs().max_element() <= tol
    }

    #[test]
    fn center_maps_to_origin() {
        let vp = Viewport::new(1920, 1080);
        assert!(close(vp.to_ndc(vp.center()), Vec2::ZERO, 1e-6));
    }

    #[test]
    fn top_left_maps_to_minus_one_plus_one() {
        let vp = Viewport::new(800, 600);
        assert!(close(vp.to_ndc(ScreenPoint::new(0.0, 0.0)), Vec2::new(-1.0, 1.0), 1e-6));
    }

    #[test]
    fn bottom_right_pixel_maps_near_one_minus_one() {
        let vp = Viewport::new(800, 600);
        let ndc = vp.to_ndc(ScreenPoint::new(799.0, 599.0));
        // One pixel short of the edge.
        let tol = 2.0 / 600.0;
        assert!(close(ndc, Vec2::new(1.0, -1.0), tol));
    }

    #[test]
    fn zero_sized_viewport_does_not_divide_by_zero() {
        let vp = Viewport {
            width: 0,
            height: 0,
        };
        let ndc = vp.to_ndc(ScreenPoint::new(0.0, 0.0));
        assert!(ndc.is_finite());
        assert_eq!(vp.aspect(), 1.0);
    }
}
