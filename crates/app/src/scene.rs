//! Stand-in scene: an arm-like cylinder, a camera and a placeholder tattoo

use std::f32::consts::{PI, TAU};

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};
use tattoo::{Mesh, Ray, TattooImage};

/// Radius of the stand-in arm
pub const ARM_RADIUS: f32 = 0.35;
/// Length of the stand-in arm along Y
pub const ARM_LENGTH: f32 = 2.0;

/// Open cylinder along Y, centred on the origin.
///
/// U runs once around the circumference and V along the length, so the
/// whole side maps onto the canvas. The seam column is duplicated to keep
/// UVs continuous.
pub fn arm_mesh(segments: u32, rings: u32, with_uvs: bool) -> Result<Mesh> {
    let segments = segments.max(3);
    let rings = rings.max(1);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let y = (v - 0.5) * ARM_LENGTH;
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let angle = u * TAU;
            let normal = Vec3::new(angle.sin(), 0.0, angle.cos());
            positions.push(normal * ARM_RADIUS + Vec3::Y * y);
            normals.push(normal);
            uvs.push(Vec2::new(u, v));
        }
    }

    let stride = segments + 1;
    let mut indices = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            // Counter-clockwise seen from outside
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    Ok(Mesh::new(
        positions,
        normals,
        with_uvs.then_some(uvs),
        indices,
    )?)
}

/// Perspective camera looking at the origin
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            fov_y: PI / 4.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn inverse_view_projection(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        (projection * view).inverse()
    }

    /// Pick ray through a point in normalized device coordinates
    pub fn ray(&self, ndc: Vec2) -> Ray {
        Ray::from_ndc(ndc, self.inverse_view_projection())
    }
}

/// Solid disc with a transparent surround, used when no image is given
pub fn placeholder_tattoo(size: u32, color: [u8; 3]) -> Result<TattooImage> {
    let radius = size as f32 * 0.5;
    let image = image::RgbaImage::from_fn(size, size, |x, y| {
        let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - Vec2::splat(radius);
        let alpha = if d.length() <= radius { 255 } else { 0 };
        image::Rgba([color[0], color[1], color[2], alpha])
    });
    Ok(TattooImage::from_rgba_image(image)?)
}
