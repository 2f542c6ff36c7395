use glam::{Mat4, Vec2, Vec3};
use roadscene_scene::Ray;
use serde::{Deserialize, Serialize};

/// Perspective camera looking at a target point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            ..Self::default()
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    /// Camera-space +X expressed in world space.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or(Vec3::X)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the camera through a device-space point.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let through = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.position, through - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 10.0));
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        let vp = cam.view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = PerspectiveCamera::default();
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!(ray.origin.abs_diff_eq(cam.position, 1e-6));
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-4));
    }

    #[test]
    fn corner_ray_spreads_by_half_fov() {
        let cam = PerspectiveCamera {
            aspect: 1.0,
            ..PerspectiveCamera::default()
        };
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 1.0));
        let angle = ray.direction.angle_between(Vec3::NEG_Z).to_degrees();
        assert!((angle - 37.5).abs() < 0.05);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut cam = PerspectiveCamera::default();
        cam.set_aspect(0.0);
        cam.set_aspect(f32::NAN);
        assert_eq!(cam.aspect, 16.0 / 9.0);
        cam.set_aspect(2.0);
        assert_eq!(cam.aspect, 2.0);
    }
}
