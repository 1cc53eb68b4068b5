//! Triangle meshes used as placement targets.
//!
//! A [`Mesh`] is an indexed triangle list in object space with per-vertex
//! normals and optional per-vertex UVs. It is validated once on construction
//! and immutable afterwards, so the ray intersector and the decal clipper can
//! index into it without further checks.

use glam::{Affine3A, Vec2, Vec3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("index count {0} is not divisible by 3")]
    IndexCount(usize),
    #[error("triangle soup mixes triangles with and without UVs")]
    MixedUvs,
    #[error("mesh has no position attribute")]
    NoPositions,
    #[error("mesh has no triangle indices")]
    NoIndices,
}

/// One triangle with its vertex attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: Option<[Vec2; 3]>,
}

impl Triangle {
    /// Unit geometric normal following counter-clockwise winding.
    /// Zero for degenerate triangles.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (b - a).cross(c - a).normalize_or_zero()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A box containing nothing
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Bounds of this box after an affine transform
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        if self.is_empty() {
            return *self;
        }
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        Self::from_points(corners.map(|c| transform.transform_point3(c)))
    }

    /// Slab test. Returns the distance at which the ray enters the box
    /// (zero when the origin is inside), or `None` on a miss.
    ///
    /// Faces count as inside, including for axes the ray runs parallel to.
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut t_near = 0.0_f32;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d == 0.0 {
                // Parallel: the slab never changes, so the origin decides
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let t0 = (lo - o) / d;
            let t1 = (hi - o) / d;
            t_near = t_near.max(t0.min(t1));
            t_far = t_far.min(t0.max(t1));
            if t_far < t_near {
                return None;
            }
        }
        Some(t_near)
    }
}

/// Indexed triangle mesh in object space.
#[derive(Debug, Clone)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Mesh {
    /// Build a mesh from indexed vertex attributes.
    ///
    /// `normals` may be empty, in which case area-weighted vertex normals are
    /// generated from the triangles.
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uvs: Option<Vec<Vec2>>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }

        let normals = if normals.is_empty() {
            compute_vertex_normals(&positions, &indices)
        } else if normals.len() != positions.len() {
            return Err(MeshError::AttributeLength {
                attribute: "normals",
                expected: positions.len(),
                actual: normals.len(),
            });
        } else {
            normals
        };

        if let Some(uvs) = &uvs {
            if uvs.len() != positions.len() {
                return Err(MeshError::AttributeLength {
                    attribute: "uvs",
                    expected: positions.len(),
                    actual: uvs.len(),
                });
            }
        }

        let bounds = Aabb::from_points(positions.iter().copied());

        Ok(Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        })
    }

    /// Build a mesh from a triangle soup. Vertices are not shared.
    pub fn from_triangles(triangles: &[Triangle]) -> Result<Self, MeshError> {
        let with_uvs = triangles.first().is_some_and(|t| t.uvs.is_some());
        if triangles.iter().any(|t| t.uvs.is_some() != with_uvs) {
            return Err(MeshError::MixedUvs);
        }

        let mut positions = Vec::with_capacity(triangles.len() * 3);
        let mut normals = Vec::with_capacity(triangles.len() * 3);
        let mut uvs = with_uvs.then(|| Vec::with_capacity(triangles.len() * 3));

        for tri in triangles {
            positions.extend_from_slice(&tri.positions);
            normals.extend_from_slice(&tri.normals);
            if let (Some(out), Some(tri_uvs)) = (uvs.as_mut(), tri.uvs) {
                out.extend_from_slice(&tri_uvs);
            }
        }

        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, normals, uvs, indices)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Vertex indices of a triangle
    #[inline]
    pub fn triangle_indices(&self, tri_index: usize) -> [usize; 3] {
        let base = tri_index * 3;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    /// Vertex positions of a triangle
    #[inline]
    pub fn triangle_positions(&self, tri_index: usize) -> [Vec3; 3] {
        self.triangle_indices(tri_index).map(|i| self.positions[i])
    }

    /// All attributes of a triangle
    pub fn triangle(&self, tri_index: usize) -> Triangle {
        let idx = self.triangle_indices(tri_index);
        Triangle {
            positions: idx.map(|i| self.positions[i]),
            normals: idx.map(|i| self.normals[i]),
            uvs: self.uvs.as_ref().map(|uvs| idx.map(|i| uvs[i])),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> Option<&[Vec2]> {
        self.uvs.as_deref()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Object-space bounds
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Area-weighted vertex normals. Vertices touched only by degenerate
/// triangles get +Y.
fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        // Unnormalized cross product weights by area
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        accum[a] += n;
        accum[b] += n;
        accum[c] += n;
    }
    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_positions() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_new_generates_normals() {
        let mesh = Mesh::new(quad_positions(), Vec::new(), None, vec![0, 1, 2, 0, 2, 3]).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        for n in mesh.normals() {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
        assert!(!mesh.has_uvs());
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let result = Mesh::new(quad_positions(), Vec::new(), None, vec![0, 1, 7]);
        assert_eq!(
            result.unwrap_err(),
            MeshError::IndexOutOfRange {
                index: 7,
                vertex_count: 4
            }
        );
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let result = Mesh::new(quad_positions(), Vec::new(), None, vec![0, 1]);
        assert_eq!(result.unwrap_err(), MeshError::IndexCount(2));
    }

    #[test]
    fn test_rejects_uv_length_mismatch() {
        let result = Mesh::new(
            quad_positions(),
            Vec::new(),
            Some(vec![Vec2::ZERO; 3]),
            vec![0, 1, 2],
        );
        assert!(matches!(
            result,
            Err(MeshError::AttributeLength { attribute: "uvs", .. })
        ));
    }

    #[test]
    fn test_from_triangles_rejects_mixed_uvs() {
        let with = Triangle {
            positions: [Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: [Vec3::Z; 3],
            uvs: Some([Vec2::ZERO, Vec2::X, Vec2::Y]),
        };
        let without = Triangle { uvs: None, ..with };
        assert_eq!(
            Mesh::from_triangles(&[with, without]).unwrap_err(),
            MeshError::MixedUvs
        );
    }

    #[test]
    fn test_from_triangles_round_trips_attributes() {
        let tri = Triangle {
            positions: [Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: [Vec3::Z; 3],
            uvs: Some([Vec2::ZERO, Vec2::X, Vec2::Y]),
        };
        let mesh = Mesh::from_triangles(&[tri]).unwrap();
        assert_eq!(mesh.triangle(0), tri);
        assert!((tri.face_normal() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_bounds_and_ray_entry() {
        let mesh = Mesh::new(quad_positions(), Vec::new(), None, vec![0, 1, 2]).unwrap();
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));

        let t = bounds.ray_entry(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((t.unwrap() - 5.0).abs() < 1e-6);
        assert!(bounds.ray_entry(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
        assert!(bounds.ray_entry(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_aabb_ray_parallel_to_face() {
        let bounds = Aabb::from_points([Vec3::splat(-1.0), Vec3::ONE]);
        // Origin on the x = -1 face, travelling along it
        let t = bounds.ray_entry(Vec3::new(-1.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((t.unwrap() - 4.0).abs() < 1e-6);
        let t = bounds.ray_entry(Vec3::new(1.0, 1.0, 5.0), Vec3::NEG_Z);
        assert!((t.unwrap() - 4.0).abs() < 1e-6);
        assert!(bounds.ray_entry(Vec3::new(-1.001, 0.0, 5.0), Vec3::NEG_Z).is_none());
        // Origin inside
        assert_eq!(bounds.ray_entry(Vec3::ZERO, Vec3::X), Some(0.0));
    }

    #[test]
    fn test_aabb_transformed() {
        let bounds = Aabb::from_points([Vec3::ZERO, Vec3::ONE]);
        let moved = bounds.transformed(&Affine3A::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(moved.max, Vec3::new(3.0, 1.0, 1.0));
        assert!(Aabb::EMPTY.is_empty());
    }
}
