use glam::Vec3;
use thiserror::Error;

use crate::types::{ObjectId, SurfaceHandle};

/// Recoverable placement failures. None of them leaves the canvas, the
/// meshes or earlier decals in a modified state.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PlacementError {
    #[error("Ray does not intersect any registered target")]
    NoIntersection,
    #[error("Hit mesh has no UV coordinates; use a clipped decal instead")]
    MissingUv,
    #[error("No tattoo image loaded")]
    NoImageLoaded,
    #[error("Invalid size scale: {0} (must be finite and > 0)")]
    InvalidScale(f32),
    #[error("Decal box does not intersect any geometry")]
    EmptyClipResult,
    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),
    #[error("Unknown surface: {0:?}")]
    UnknownSurface(SurfaceHandle),
}

/// Validate a stamp size scale
pub fn validate_size_scale(scale: f32) -> Result<f32, PlacementError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(PlacementError::InvalidScale(scale))
    }
}

/// A decal box needs a positive finite extent on every axis
pub fn valid_half_extents(half_extents: Vec3) -> bool {
    half_extents.is_finite() && half_extents.cmpgt(Vec3::ZERO).all()
}
