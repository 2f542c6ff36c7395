use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// Indexed triangle list shared by the renderer and the raycaster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = self.positions.get(tri[0] as usize)?;
            let b = self.positions.get(tri[1] as usize)?;
            let c = self.positions.get(tri[2] as usize)?;
            Some([Vec3::from(*a), Vec3::from(*b), Vec3::from(*c)])
        })
    }

    /// Axis-aligned bounds in local space, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Fill in flat per-face normals when the source had none.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() {
            return;
        }
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        let corner = |i: u32| self.positions.get(i as usize).map(|p| Vec3::from(*p));
        for tri in self.indices.chunks_exact(3) {
            // Triangles referencing missing vertices contribute nothing.
            let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2])) else {
                continue;
            };
            let n = (b - a).cross(c - a);
            for i in tri {
                normals[*i as usize] += n;
            }
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Y).to_array())
            .collect();
    }
}

/// Shape definition of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box centred on the origin.
    Box { width: f32, height: f32, depth: f32 },
    /// Rectangle in the local XY plane, facing +Z.
    Plane { width: f32, height: f32 },
    /// Arbitrary imported mesh.
    Mesh(Arc<TriangleMesh>),
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Self::Box {
            width: size,
            height: size,
            depth: size,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Plane { .. } => "plane",
            Self::Mesh(_) => "mesh",
        }
    }

    pub fn tessellate(&self) -> Cow<'_, TriangleMesh> {
        match self {
            Self::Box {
                width,
                height,
                depth,
            } => Cow::Owned(box_mesh(*width, *height, *depth)),
            Self::Plane { width, height } => Cow::Owned(plane_mesh(*width, *height)),
            Self::Mesh(mesh) => Cow::Borrowed(mesh.as_ref()),
        }
    }
}

fn plane_mesh(width: f32, height: f32) -> TriangleMesh {
    let (hw, hh) = (width * 0.5, height * 0.5);
    TriangleMesh {
        positions: vec![[-hw, -hh, 0.0], [hw, -hh, 0.0], [hw, hh, 0.0], [-hw, hh, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        uvs: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

fn box_mesh(width: f32, height: f32, depth: f32) -> TriangleMesh {
    let h = Vec3::new(width, height, depth) * 0.5;
    // (normal, u axis, v axis); u x v == normal keeps every face counter-clockwise.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut mesh = TriangleMesh::default();
    for (normal, u, v) in faces {
        let base = mesh.positions.len() as u32;
        for (su, sv, uv) in [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ] {
            let p = (normal + u * su + v * sv) * h;
            mesh.positions.push(p.to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push(uv);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_has_24_vertices_and_12_triangles() {
        let cube = Geometry::cube(1.0);
        let mesh = cube.tessellate();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        let (lo, hi) = mesh.bounds().unwrap();
        assert!(lo.abs_diff_eq(Vec3::splat(-0.5), 1e-6));
        assert!(hi.abs_diff_eq(Vec3::splat(0.5), 1e-6));
    }

    #[test]
    fn box_faces_wind_towards_their_normal() {
        let mesh = Geometry::Box {
            width: 2.0,
            height: 1.0,
            depth: 3.0,
        }
        .tessellate()
        .into_owned();
        for (i, [a, b, c]) in mesh.triangles().enumerate() {
            let n = Vec3::from(mesh.normals[mesh.indices[i * 3] as usize]);
            assert!((b - a).cross(c - a).dot(n) > 0.0, "triangle {i} is inverted");
        }
    }

    #[test]
    fn plane_spans_requested_extent() {
        let mesh = Geometry::Plane {
            width: 10.0,
            height: 50.0,
        }
        .tessellate();
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-5.0, -25.0, 0.0));
        assert_eq!(hi, Vec3::new(5.0, 25.0, 0.0));
    }

    #[test]
    fn imported_mesh_is_borrowed() {
        let geometry = Geometry::Mesh(Arc::new(TriangleMesh::default()));
        assert!(matches!(geometry.tessellate(), Cow::Borrowed(_)));
        assert!(geometry.tessellate().bounds().is_none());
    }

    #[test]
    fn ensure_normals_fills_flat_normals() {
        let mut mesh = TriangleMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..TriangleMesh::default()
        };
        mesh.ensure_normals();
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn ensure_normals_skips_out_of_range_triangles() {
        let mut mesh = TriangleMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 5, 0, 1, 2],
            ..TriangleMesh::default()
        };
        mesh.ensure_normals();
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
    }
}
