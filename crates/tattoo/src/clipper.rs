//! Decal box clipper
//!
//! Builds standalone decal geometry by clipping a mesh against an oriented
//! box. Every triangle is moved into the box's local frame, clipped against
//! the six faces with Sutherland-Hodgman, fan-triangulated and given UVs from
//! its local x/y position. The result is returned in world space.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Mat3A, Vec2, Vec3};
use tracing::{debug, warn};

use crate::constants::CLIP_EPSILON;
use crate::mesh::Mesh;
use crate::projection::DecalFrame;
use crate::tattoo_image::TattooImage;
use crate::types::DecalDescriptor;
use crate::validation::{PlacementError, valid_half_extents};

/// Polygon vertex during clipping, in decal-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub position: Vec3,
    pub normal: Vec3,
}

impl ClipVertex {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// One face of the clip box: keeps points with `sign * p[axis] <= limit`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub axis: usize,
    pub sign: f32,
    pub limit: f32,
}

impl ClipPlane {
    /// Signed distance to the plane, positive inside
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.limit - self.sign * point[self.axis]
    }

    #[inline]
    fn contains(&self, point: Vec3) -> bool {
        self.distance(point) >= -CLIP_EPSILON
    }
}

/// The six faces of the box `[-half_extents, +half_extents]`
pub fn box_planes(half_extents: Vec3) -> [ClipPlane; 6] {
    let plane = |axis: usize, sign: f32| ClipPlane {
        axis,
        sign,
        limit: half_extents[axis],
    };
    [
        plane(0, 1.0),
        plane(0, -1.0),
        plane(1, 1.0),
        plane(1, -1.0),
        plane(2, 1.0),
        plane(2, -1.0),
    ]
}

/// Clip a convex polygon against one plane.
///
/// Walks each edge `prev -> current`, keeping inside vertices and inserting
/// the crossing point where an edge passes through the plane. Input order is
/// preserved, so a polygon entirely inside comes back unchanged.
pub fn clip_polygon_to_plane(polygon: &[ClipVertex], plane: &ClipPlane) -> Vec<ClipVertex> {
    if polygon.is_empty() {
        return Vec::new();
    }

    let mut output = Vec::with_capacity(polygon.len() + 1);
    let mut prev = polygon[polygon.len() - 1];
    let mut prev_dist = plane.distance(prev.position);

    for &current in polygon {
        let current_dist = plane.distance(current.position);
        let prev_inside = prev_dist >= -CLIP_EPSILON;
        let current_inside = current_dist >= -CLIP_EPSILON;

        if current_inside != prev_inside {
            let denom = prev_dist - current_dist;
            if denom.abs() > f32::EPSILON {
                output.push(prev.lerp(current, prev_dist / denom));
            }
        }
        if current_inside {
            output.push(current);
        }

        prev = current;
        prev_dist = current_dist;
    }
    output
}

/// Clip a convex polygon against all six faces of the box.
///
/// Returns an empty polygon when fewer than three vertices survive.
pub fn clip_polygon_to_box(polygon: &[ClipVertex], half_extents: Vec3) -> Vec<ClipVertex> {
    let planes = box_planes(half_extents);

    // Trivial reject: every vertex outside the same face
    if planes
        .iter()
        .any(|p| polygon.iter().all(|v| !p.contains(v.position)))
    {
        return Vec::new();
    }

    let mut clipped = polygon.to_vec();
    for plane in &planes {
        if clipped.iter().all(|v| plane.contains(v.position)) {
            continue;
        }
        clipped = clip_polygon_to_plane(&clipped, plane);
        if clipped.len() < 3 {
            return Vec::new();
        }
    }
    clipped
}

/// Fan-triangulate a convex polygon of `vertex_count` vertices whose first
/// vertex has index `base`.
pub fn fan_triangulate(base: u32, vertex_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(vertex_count.saturating_sub(2) * 3);
    for i in 1..vertex_count.saturating_sub(1) as u32 {
        indices.extend_from_slice(&[base, base + i, base + i + 1]);
    }
    indices
}

/// Decal UV from a local-space position: x and y are remapped from
/// `[-half, +half]` to `[0, 1]`.
#[inline]
pub fn box_uv(local: Vec3, half_extents: Vec3) -> Vec2 {
    Vec2::new(
        (local.x / half_extents.x + 1.0) * 0.5,
        (local.y / half_extents.y + 1.0) * 0.5,
    )
}

/// Interleaved vertex layout for GPU upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DecalVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Clipped decal geometry in world space.
///
/// Never modified after creation; the image is shared with the session that
/// placed it.
#[derive(Debug, Clone)]
pub struct DecalMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub image: Arc<TattooImage>,
    pub descriptor: DecalDescriptor,
}

impl DecalMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Interleaved vertices, matching `indices`
    pub fn vertices(&self) -> Vec<DecalVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| DecalVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }
}

/// Clip `mesh` (placed in the world by `world_from_object`) against the
/// decal box described by `descriptor`.
///
/// # Errors
/// `EmptyClipResult` if no geometry falls inside the box, or the box has a
/// non-positive extent.
pub fn clip_mesh(
    mesh: &Mesh,
    world_from_object: Affine3A,
    descriptor: &DecalDescriptor,
    image: Arc<TattooImage>,
) -> Result<DecalMesh, PlacementError> {
    let half_extents = descriptor.half_extents;
    if !valid_half_extents(half_extents) {
        warn!("clip_mesh: invalid half extents {:?}", half_extents);
        return Err(PlacementError::EmptyClipResult);
    }

    let frame = DecalFrame::new(descriptor);
    let local_from_object = frame.local_from_world() * world_from_object;
    let normal_to_local: Mat3A = local_from_object.matrix3.inverse().transpose();

    // Move every vertex into the box frame once
    let local_vertices: Vec<ClipVertex> = mesh
        .positions()
        .iter()
        .zip(mesh.normals())
        .map(|(&p, &n)| ClipVertex {
            position: local_from_object.transform_point3(p),
            normal: normal_to_local * n,
        })
        .collect();

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    let mut contributing = 0usize;

    for tri_idx in 0..mesh.triangle_count() {
        let triangle = mesh.triangle_indices(tri_idx).map(|i| local_vertices[i]);
        let polygon = clip_polygon_to_box(&triangle, half_extents);
        if polygon.is_empty() {
            continue;
        }
        contributing += 1;

        indices.extend(fan_triangulate(positions.len() as u32, polygon.len()));
        for vertex in &polygon {
            positions.push(frame.to_world(vertex.position));
            normals.push(
                frame
                    .direction_to_world(vertex.normal)
                    .normalize_or(descriptor.orientation * Vec3::Z),
            );
            uvs.push(box_uv(vertex.position, half_extents));
        }
    }

    debug!(
        "clip_mesh: {} of {} triangles contributed, {} vertices, {} triangles out",
        contributing,
        mesh.triangle_count(),
        positions.len(),
        indices.len() / 3
    );

    if indices.is_empty() {
        return Err(PlacementError::EmptyClipResult);
    }

    Ok(DecalMesh {
        positions,
        normals,
        uvs,
        indices,
        image,
        descriptor: *descriptor,
    })
}
