use std::f32::consts::{PI, TAU};

use glam::Vec3;
use roadscene_input::{Action, Viewport};
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Advances a camera once per frame from accumulated user input.
pub trait CameraController {
    /// Feed one input action. Actions a controller does not use are ignored.
    fn handle(&mut self, _action: &Action, _camera: &PerspectiveCamera, _viewport: Viewport) {}

    /// Apply pending motion to the camera. Returns `true` if it moved.
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool;
}

/// Tunables for `OrbitControls`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub screen_space_panning: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_damping: true,
            damping_factor: 0.1,
            min_distance: 2.0,
            max_distance: 20.0,
            screen_space_panning: false,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Orbit-style controls around `camera.target` with optional damping.
///
/// Input accumulates into pending spherical and pan deltas; `update` applies a
/// `damping_factor` share of them each frame and decays the remainder, so
/// motion glides to a stop after input ends.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub settings: OrbitSettings,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move towards the target; `factor` below one.
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale *= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    /// Pixel drag to orbit: a drag across the full viewport height turns 2π.
    pub fn handle_drag(&mut self, dx: f32, dy: f32, viewport: Viewport) {
        let h = viewport.height.max(1) as f32;
        self.rotate_left(TAU * dx / h * self.settings.rotate_speed);
        self.rotate_up(TAU * dy / h * self.settings.rotate_speed);
    }

    /// Positive `lines` zooms in.
    pub fn handle_wheel(&mut self, lines: f32) {
        let factor = 0.95_f32.powf(self.settings.zoom_speed * lines.abs());
        if lines > 0.0 {
            self.dolly_in(factor);
        } else if lines < 0.0 {
            self.dolly_out(factor);
        }
    }

    /// Pixel drag to pan the target, scaled so the point under the cursor
    /// follows it at the target's depth.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport: Viewport, camera: &PerspectiveCamera) {
        let h = viewport.height.max(1) as f32;
        let target_distance = (camera.position - camera.target).length()
            * (camera.fov_degrees.to_radians() * 0.5).tan();
        let left = 2.0 * dx * target_distance / h * self.settings.pan_speed;
        let up = 2.0 * dy * target_distance / h * self.settings.pan_speed;

        let right = camera.right();
        self.pan_offset += right * -left;

        let up_axis = if self.settings.screen_space_panning {
            right.cross(camera.forward())
        } else {
            // Along the ground: perpendicular to right within the up plane.
            camera.up.cross(right)
        };
        self.pan_offset += up_axis * up;
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < EPS
            && self.delta_phi.abs() < EPS
            && self.pan_offset.length_squared() < EPS
            && (self.scale - 1.0).abs() < EPS
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

impl CameraController for OrbitControls {
    fn handle(&mut self, action: &Action, camera: &PerspectiveCamera, viewport: Viewport) {
        if !self.settings.enabled {
            return;
        }
        match action {
            Action::Orbit { dx, dy } => self.handle_drag(*dx, *dy, viewport),
            Action::Pan { dx, dy } => self.pan(*dx, *dy, viewport, camera),
            Action::Zoom(lines) => self.handle_wheel(*lines),
            _ => {}
        }
    }

    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let s = self.settings;
        let before = camera.position;

        let offset = camera.position - camera.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius < EPS {
            (0.0, 0.0)
        } else {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        };

        let share = if s.enable_damping { s.damping_factor } else { 1.0 };
        theta += self.delta_theta * share;
        phi += self.delta_phi * share;
        phi = phi.clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(s.min_distance, s.max_distance);
        camera.target += self.pan_offset * share;

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + new_offset;

        if s.enable_damping {
            self.delta_theta *= 1.0 - s.damping_factor;
            self.delta_phi *= 1.0 - s.damping_factor;
            self.pan_offset *= 1.0 - s.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = camera.position.distance_squared(before) > EPS;
        if moved {
            tracing::trace!(
                "orbit camera at ({:.2}, {:.2}, {:.2})",
                camera.position.x,
                camera.position.y,
                camera.position.z
            );
        }
        moved
    }
}
