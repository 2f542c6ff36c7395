use glam::{Mat4, Vec3};
use roadscene_common::ObjectId;

use crate::geometry::TriangleMesh;

const EPSILON: f32 = 1e-7;

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// One ray hit against one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub object: ObjectId,
    /// World-space distance from the ray origin.
    pub distance: f32,
    pub point: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test against an axis-aligned box; returns the entry parameter.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let inv = self.direction.recip();
        let t0 = (min - self.origin) * inv;
        let t1 = (max - self.origin) * inv;
        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();
        (far >= near.max(0.0)).then_some(near.max(0.0))
    }

    /// Moller-Trumbore. With `cull_back` only faces wound counter-clockwise
    /// as seen by the ray are hit.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3, cull_back: bool) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        let degenerate = if cull_back { det < EPSILON } else { det.abs() < EPSILON };
        if degenerate {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }

    /// Nearest hit against a mesh placed by `model`; distance and point are in
    /// world space.
    pub fn intersect_mesh(
        &self,
        mesh: &TriangleMesh,
        model: Mat4,
        cull_back: bool,
    ) -> Option<(f32, Vec3)> {
        let inverse = model.inverse();
        if !inverse.is_finite() {
            return None;
        }
        let local_origin = inverse.transform_point3(self.origin);
        let local_dir = inverse.transform_vector3(self.direction);
        if local_dir.length_squared() < EPSILON {
            return None;
        }
        let local = Ray::new(local_origin, local_dir);

        let (lo, hi) = mesh.bounds()?;
        // Flat meshes have zero thickness on one axis; pad so the slab test holds.
        local.intersect_aabb(lo - Vec3::splat(1e-4), hi + Vec3::splat(1e-4))?;

        let local_t = mesh
            .triangles()
            .filter_map(|[a, b, c]| local.intersect_triangle(a, b, c, cull_back))
            .min_by(f32::total_cmp)?;
        let point = model.transform_point3(local.at(local_t));
        Some((point.distance(self.origin), point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use glam::Quat;

    fn down_negative_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn hits_front_face_of_unit_cube() {
        let mesh = Geometry::cube(1.0).tessellate().into_owned();
        let (distance, point) = down_negative_z()
            .intersect_mesh(&mesh, Mat4::IDENTITY, true)
            .unwrap();
        assert!((distance - 9.5).abs() < 1e-5);
        assert!(point.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-5));
    }

    #[test]
    fn back_faces_are_culled() {
        let mesh = Geometry::Plane {
            width: 2.0,
            height: 2.0,
        }
        .tessellate()
        .into_owned();
        let from_behind = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(from_behind.intersect_mesh(&mesh, Mat4::IDENTITY, true).is_none());
        assert!(down_negative_z().intersect_mesh(&mesh, Mat4::IDENTITY, true).is_some());
    }

    #[test]
    fn two_sided_meshes_are_hit_from_behind() {
        let mesh = Geometry::Plane {
            width: 2.0,
            height: 2.0,
        }
        .tessellate()
        .into_owned();
        let from_behind = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let (distance, point) = from_behind
            .intersect_mesh(&mesh, Mat4::IDENTITY, false)
            .unwrap();
        assert!((distance - 5.0).abs() < 1e-5);
        assert!(point.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn model_transform_is_respected() {
        let mesh = Geometry::cube(1.0).tessellate().into_owned();
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -3.0),
        );
        let (distance, _) = down_negative_z().intersect_mesh(&mesh, model, true).unwrap();
        // Front face sits at z = -3 + 1.
        assert!((distance - 12.0).abs() < 1e-4);
    }

    #[test]
    fn miss_beside_the_mesh() {
        let mesh = Geometry::cube(1.0).tessellate().into_owned();
        let ray = Ray::new(Vec3::new(3.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(ray.intersect_mesh(&mesh, Mat4::IDENTITY, true).is_none());
    }

    #[test]
    fn aabb_behind_origin_is_missed() {
        let ray = down_negative_z();
        assert!(ray
            .intersect_aabb(Vec3::new(-1.0, -1.0, 11.0), Vec3::new(1.0, 1.0, 12.0))
            .is_none());
        assert_eq!(
            ray.intersect_aabb(Vec3::splat(-1.0), Vec3::splat(1.0)),
            Some(9.0)
        );
    }
}
