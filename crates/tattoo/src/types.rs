use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A world-space ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction, or zero for a degenerate ray that hits nothing
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    ///
    /// A zero-length direction produces a degenerate ray that never
    /// intersects anything.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Build a pick ray from normalized device coordinates.
    ///
    /// `ndc` is in [-1, 1] with +y up. `inverse_view_projection` must come from
    /// a projection with a finite depth range; the ray starts on the near plane.
    pub fn from_ndc(ndc: Vec2, inverse_view_projection: Mat4) -> Self {
        let near = inverse_view_projection.project_point3(ndc.extend(0.0));
        let far = inverse_view_projection.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }

    /// Point at distance `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }
}

/// Identifier of a mesh registered as a placement target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Handle to a paintable canvas shared by one or more targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u32);

/// Identifier of a decal mesh owned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecalId(pub u32);

/// Nearest intersection of a ray with a registered target.
///
/// All vectors are in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// World-space hit position
    pub point: Vec3,
    /// Interpolated vertex normal (unit length)
    pub normal: Vec3,
    /// Geometric normal of the hit triangle (unit length)
    pub face_normal: Vec3,
    /// Interpolated UV, present only when the mesh carries UVs
    pub uv: Option<Vec2>,
    /// Barycentric weights (w0, w1, w2) of the hit within its triangle
    pub barycentric: Vec3,
    /// Distance from the ray origin to `point`
    pub distance: f32,
    /// Triangle index within the target mesh
    pub triangle_index: u32,
    /// Target that was hit
    pub object: ObjectId,
}

/// Oriented box parameterizing one clip-based placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecalDescriptor {
    /// Box centre in world space
    pub position: Vec3,
    /// Rotation taking the local +Z axis onto the surface normal
    pub orientation: Quat,
    /// Half size of the box along its local axes
    pub half_extents: Vec3,
}
