//! Ray-mesh intersection for tattoo placement.
//!
//! This module provides ray-triangle intersection using the Moller-Trumbore algorithm,
//! with support for interpolating vertex attributes (UVs, normals) at hit points.
//!
//! All functions here work in the mesh's object space. The registry transforms
//! world rays in and hit records out.

use glam::{Vec2, Vec3};
use tattlab_config::RaycastConfig;

use crate::constants::RAY_EPSILON;
use crate::mesh::Mesh;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Options controlling a mesh ray cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaycastOptions {
    /// When false, a bounds test may reject the mesh before any triangle
    /// is tested. Hits are identical either way.
    pub test_all_triangles: bool,
    /// Skip triangles whose counter-clockwise face points away from the ray
    pub cull_back_faces: bool,
}

impl Default for RaycastOptions {
    fn default() -> Self {
        Self {
            test_all_triangles: true,
            cull_back_faces: false,
        }
    }
}

impl From<&RaycastConfig> for RaycastOptions {
    fn from(config: &RaycastConfig) -> Self {
        Self {
            test_all_triangles: config.test_all_triangles,
            cull_back_faces: config.cull_back_faces,
        }
    }
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle in front of its origin.
///
/// # Arguments
/// * `ray_origin` - Origin point of the ray
/// * `ray_dir` - Direction of the ray (should be normalized for consistent t values)
/// * `v0`, `v1`, `v2` - Triangle vertices in counter-clockwise order
/// * `cull_back_faces` - Reject hits on the clockwise side of the triangle
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    cull_back_faces: bool,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Positive determinant means the ray travels against the face normal
    if cull_back_faces {
        if det < RAY_EPSILON {
            return None;
        }
    } else if det.abs() < RAY_EPSILON {
        // Ray lies in the plane of the triangle or the triangle is degenerate
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;

    // Only accept hits in front of the ray
    if t < RAY_EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Interpolate a Vec3 attribute using barycentric coordinates.
pub fn interpolate_vec3(v0: Vec3, v1: Vec3, v2: Vec3, u: f32, v: f32) -> Vec3 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Interpolate a Vec2 attribute (like UVs) using barycentric coordinates.
pub fn interpolate_vec2(v0: Vec2, v1: Vec2, v2: Vec2, u: f32, v: f32) -> Vec2 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Closest hit on a mesh, in the mesh's object space.
#[derive(Debug, Clone, Copy)]
pub struct MeshHit {
    /// Distance along the (object-space) ray
    pub t: f32,
    /// Index of the triangle that was hit
    pub triangle_index: u32,
    /// Barycentric weights (w0, w1, w2)
    pub barycentric: Vec3,
    /// Hit position
    pub position: Vec3,
    /// Interpolated vertex normal, falling back to the face normal
    pub normal: Vec3,
    /// Geometric normal of the triangle
    pub face_normal: Vec3,
    /// Interpolated UV if the mesh has UVs
    pub uv: Option<Vec2>,
}

/// Cast a ray against a mesh and return the closest hit.
///
/// Triangles are tested in index order and a later triangle replaces the
/// current best only when it is strictly closer, so equal-distance hits
/// (coplanar or shared-edge geometry) resolve to the first triangle.
///
/// # Arguments
/// * `ray_origin` - Origin of the ray in mesh local space
/// * `ray_dir` - Direction of the ray (should be normalized)
/// * `mesh` - Target mesh
/// * `options` - Broad-phase and culling behaviour
pub fn raycast_mesh(
    ray_origin: Vec3,
    ray_dir: Vec3,
    mesh: &Mesh,
    options: RaycastOptions,
) -> Option<MeshHit> {
    if !options.test_all_triangles && mesh.bounds().ray_entry(ray_origin, ray_dir).is_none() {
        return None;
    }

    let mut closest_hit: Option<(TriangleHit, usize)> = None;

    for tri_idx in 0..mesh.triangle_count() {
        let [v0, v1, v2] = mesh.triangle_positions(tri_idx);

        if let Some(hit) =
            ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2, options.cull_back_faces)
        {
            let closer = match &closest_hit {
                Some((prev, _)) => hit.t < prev.t,
                None => true,
            };
            if closer {
                closest_hit = Some((hit, tri_idx));
            }
        }
    }

    closest_hit.map(|(hit, tri_idx)| {
        let tri = mesh.triangle(tri_idx);
        let face_normal = tri.face_normal();

        let [n0, n1, n2] = tri.normals;
        let normal = interpolate_vec3(n0, n1, n2, hit.u, hit.v)
            .try_normalize()
            .unwrap_or(face_normal);

        let uv = tri
            .uvs
            .map(|[uv0, uv1, uv2]| interpolate_vec2(uv0, uv1, uv2, hit.u, hit.v));

        MeshHit {
            t: hit.t,
            triangle_index: tri_idx as u32,
            barycentric: Vec3::new(1.0 - hit.u - hit.v, hit.u, hit.v),
            position: ray_origin + ray_dir * hit.t,
            normal,
            face_normal,
            uv,
        }
    })
}
