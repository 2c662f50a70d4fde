use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::field::SurfacePayload;

/// Flat GPU-ready triangle mesh: three floats per vertex position and
/// normal, three indices per triangle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flattens a generator payload and computes area-weighted vertex
    /// normals from face winding. An empty payload yields an empty mesh.
    pub fn from_payload(payload: &SurfacePayload) -> Self {
        let mut positions = Vec::with_capacity(payload.vertices.len() * 3);
        for v in &payload.vertices {
            positions.extend_from_slice(v);
        }

        let mut indices = Vec::with_capacity(payload.faces.len() * 3);
        for face in &payload.faces {
            indices.extend_from_slice(face);
        }

        let normals = accumulate_normals(&positions, &indices);

        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn aabb(&self) -> Option<Aabb> {
        if self.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for chunk in self.positions.chunks_exact(3) {
            let p = Vec3::new(chunk[0], chunk[1], chunk[2]);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Aabb { min, max })
    }

}

/// Cross products of unnormalized edge vectors weight each face's
/// contribution by its area, then the per-vertex sums are normalized.
fn accumulate_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];

    let vertex = |i: u32| -> Vec3 {
        let base = i as usize * 3;
        Vec3::new(positions[base], positions[base + 1], positions[base + 2])
    };

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        let face_normal = (vertex(i1) - vertex(i0)).cross(vertex(i2) - vertex(i0));
        for &i in tri {
            let base = i as usize * 3;
            normals[base] += face_normal.x;
            normals[base + 1] += face_normal.y;
            normals[base + 2] += face_normal.z;
        }
    }

    for chunk in normals.chunks_exact_mut(3) {
        let n = Vec3::new(chunk[0], chunk[1], chunk[2]);
        let len = n.length();
        if len > 1e-12 {
            chunk[0] = n.x / len;
            chunk[1] = n.y / len;
            chunk[2] = n.z / len;
        }
    }

    normals
}

/// Axis-aligned bounding box of live geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dim(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Attr {
        fn position(&self, i: u32) -> Vec3;
        fn normal(&self, i: u32) -> Vec3;
    }

    impl Attr for SurfaceMesh {
        fn position(&self, i: u32) -> Vec3 {
            let base = i as usize * 3;
            Vec3::new(
                self.positions[base],
                self.positions[base + 1],
                self.positions[base + 2],
            )
        }

        fn normal(&self, i: u32) -> Vec3 {
            let base = i as usize * 3;
            Vec3::new(
                self.normals[base],
                self.normals[base + 1],
                self.normals[base + 2],
            )
        }
    }

    fn quad_payload() -> SurfacePayload {
        // Unit quad in the xy plane, both triangles wound counterclockwise
        // as seen from +z.
        SurfacePayload {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            faces: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn flattens_positions_and_indices() {
        let mesh = SurfaceMesh::from_payload(&quad_payload());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.positions.len(), 12);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn planar_quad_normals_point_along_plus_z() {
        let mesh = SurfaceMesh::from_payload(&quad_payload());
        for i in 0..mesh.vertex_count() as u32 {
            let n = mesh.normal(i);
            assert!((n - Vec3::Z).length() < 1e-6, "normal {n:?} not +Z");
        }
    }

    #[test]
    fn normals_are_unit_length_on_a_bent_strip() {
        // Two triangles folded along the shared edge; the shared vertices
        // get an averaged, still unit-length normal.
        let payload = SurfacePayload {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 0.0, 1.0],
            ],
            faces: vec![[0, 1, 2], [1, 3, 2]],
        };
        let mesh = SurfaceMesh::from_payload(&payload);
        for i in 0..mesh.vertex_count() as u32 {
            assert!((mesh.normal(i).length() - 1.0).abs() < 1e-5);
            assert!(mesh.normal(i).z > 0.0, "winding flipped");
        }
        // Vertices on the fold average both faces; the outliers keep
        // their single face normal.
        assert!(mesh.normal(1) != mesh.normal(0));
    }

    #[test]
    fn empty_payload_builds_empty_mesh() {
        let mesh = SurfaceMesh::from_payload(&SurfacePayload::default());
        assert!(mesh.is_empty());
        assert_eq!(mesh.aabb(), None);
    }

    #[test]
    fn aabb_spans_all_vertices() {
        let mesh = SurfaceMesh::from_payload(&quad_payload());
        let aabb = mesh.aabb().unwrap();
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(aabb.max_dim(), 1.0);
    }

    #[test]
    fn aabb_union_covers_both_boxes() {
        let a = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::ZERO,
        };
        let b = Aabb {
            min: Vec3::ZERO,
            max: Vec3::new(2.0, 0.5, 1.0),
        };
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::splat(-1.0));
        assert_eq!(u.max, Vec3::new(2.0, 0.5, 1.0));
    }

    #[test]
    fn position_accessor_reads_flat_buffer() {
        let mesh = SurfaceMesh::from_payload(&quad_payload());
        assert_eq!(mesh.position(2), Vec3::new(1.0, 1.0, 0.0));
    }
}
