//! Decal frame construction.
//!
//! A clip-based placement projects the tattoo along the surface normal. The
//! decal's local frame has +Z along that normal, so the box's front face is
//! the local XY plane and UVs can be read straight off local x/y.

use glam::{Affine3A, Quat, Vec3};

use crate::constants::MIN_DIRECTION_LENGTH_SQ;
use crate::types::DecalDescriptor;

/// Rotation taking local +Z onto `normal`.
///
/// A degenerate normal yields the identity rotation.
pub fn decal_orientation(normal: Vec3) -> Quat {
    if normal.length_squared() < MIN_DIRECTION_LENGTH_SQ || !normal.is_finite() {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(Vec3::Z, normal.normalize())
}

/// Describe the decal box for a surface hit.
///
/// The box centre is pushed `surface_bias` along the normal to keep the
/// decal off the source surface.
pub fn descriptor_from_hit(
    point: Vec3,
    normal: Vec3,
    half_extents: Vec3,
    surface_bias: f32,
) -> DecalDescriptor {
    let orientation = decal_orientation(normal);
    let forward = orientation * Vec3::Z;
    DecalDescriptor {
        position: point + forward * surface_bias,
        orientation,
        half_extents,
    }
}

/// Construct an orthonormal tangent-space basis from a surface normal.
///
/// Returns (tangent, bitangent, normal) forming a right-handed coordinate
/// system. The tangent is the image of local +X under the decal orientation,
/// so it matches the u axis of the synthesized decal UVs.
pub fn build_tangent_space(normal: Vec3) -> (Vec3, Vec3, Vec3) {
    let orientation = decal_orientation(normal);
    (
        orientation * Vec3::X,
        orientation * Vec3::Y,
        orientation * Vec3::Z,
    )
}

/// Rigid transform between world space and a decal box's local space
#[derive(Debug, Clone, Copy)]
pub struct DecalFrame {
    world_from_local: Affine3A,
    local_from_world: Affine3A,
    half_extents: Vec3,
}

impl DecalFrame {
    pub fn new(descriptor: &DecalDescriptor) -> Self {
        let world_from_local =
            Affine3A::from_rotation_translation(descriptor.orientation, descriptor.position);
        Self {
            world_from_local,
            local_from_world: world_from_local.inverse(),
            half_extents: descriptor.half_extents,
        }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    #[inline]
    pub fn world_from_local(&self) -> Affine3A {
        self.world_from_local
    }

    #[inline]
    pub fn local_from_world(&self) -> Affine3A {
        self.local_from_world
    }

    #[inline]
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.local_from_world.transform_point3(point)
    }

    #[inline]
    pub fn to_world(&self, point: Vec3) -> Vec3 {
        self.world_from_local.transform_point3(point)
    }

    /// Rotate a direction into local space. The frame is rigid, so normals
    /// need no inverse-transpose.
    #[inline]
    pub fn direction_to_local(&self, direction: Vec3) -> Vec3 {
        self.local_from_world.transform_vector3(direction)
    }

    #[inline]
    pub fn direction_to_world(&self, direction: Vec3) -> Vec3 {
        self.world_from_local.transform_vector3(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_orientation_maps_z_to_normal() {
        for normal in [
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::X,
            Vec3::new(1.0, 2.0, -0.5).normalize(),
        ] {
            let q = decal_orientation(normal);
            assert!((q * Vec3::Z - normal).length() < EPSILON, "{normal:?}");
        }
    }

    #[test]
    fn test_degenerate_normal_is_identity() {
        assert_eq!(decal_orientation(Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn test_descriptor_applies_bias() {
        let d = descriptor_from_hit(Vec3::ZERO, Vec3::Y, Vec3::splat(0.1), 0.02);
        assert!((d.position - Vec3::new(0.0, 0.02, 0.0)).length() < EPSILON);
        assert_eq!(d.half_extents, Vec3::splat(0.1));
    }

    #[test]
    fn test_tangent_space_is_orthonormal() {
        let n = Vec3::new(0.3, -0.7, 0.2).normalize();
        let (t, b, n2) = build_tangent_space(n);
        assert!((n2 - n).length() < EPSILON);
        assert!(t.dot(n).abs() < EPSILON);
        assert!(b.dot(n).abs() < EPSILON);
        assert!(t.dot(b).abs() < EPSILON);
        // Right-handed
        assert!((t.cross(b) - n).length() < EPSILON);
    }

    #[test]
    fn test_frame_round_trip() {
        let d = descriptor_from_hit(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::ONE,
            0.0,
        );
        let frame = DecalFrame::new(&d);
        let p = Vec3::new(-0.4, 0.9, 2.2);
        assert!((frame.to_world(frame.to_local(p)) - p).length() < EPSILON);
        // The hit point sits at the local origin
        assert!(frame.to_local(Vec3::new(1.0, 2.0, 3.0)).length() < EPSILON);
    }
}
