//! Complete placement pipeline
//!
//! This module connects the pieces of a placement:
//! - Session state (is a placement armed, which image, what scale)
//! - Ray casting against the registered targets
//! - UV canvas painting or box-clipped decal construction
//! - Recording the result in the registry for the renderer
//!
//! The pipeline is renderer independent. A host drives it either directly
//! or through the command queue, once per frame.

mod dispatch;
mod placement;

use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use tattlab_config::{PlacementMode, TattooConfig};
use tracing::info;

use crate::canvas::PixelRect;
use crate::raycast::RaycastOptions;
use crate::registry::SurfaceTargetRegistry;
use crate::session::PlacementSession;
use crate::tattoo_image::TattooImage;
use crate::types::{DecalId, ObjectId, SurfaceHandle};
use crate::validation::PlacementError;

/// What a pointer action or command did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// The session was not armed; nothing changed
    Ignored,
    /// A non-placement command took effect
    StateChanged,
    /// The tattoo was stamped into a canvas. `region` is `None` when the
    /// stamp fell entirely outside the canvas.
    Painted {
        object: ObjectId,
        surface: SurfaceHandle,
        region: Option<PixelRect>,
    },
    /// A decal mesh was built and registered
    Decal {
        object: ObjectId,
        id: DecalId,
        triangles: usize,
    },
    /// The decal box enclosed no geometry; treated as a completed no-op
    Empty { object: ObjectId },
}

/// Placement pipeline: session + registry + placement parameters
///
/// This struct manages the full placement workflow:
/// 1. An image is loaded and a placement armed
/// 2. Pointer rays are cast against the registry
/// 3. Hits are painted into a canvas or clipped into a decal
/// 4. The registry records the result and is marked dirty
#[derive(Debug)]
pub struct PlacementPipeline {
    registry: SurfaceTargetRegistry,
    session: PlacementSession,
    raycast: RaycastOptions,
    /// Stamp side length in canvas pixels before scaling
    stamp_base_size: f32,
    /// Decal box half size in world units
    decal_half_extents: Vec3,
    /// Outward offset of the decal box centre along the hit normal
    surface_bias: f32,
}

impl Default for PlacementPipeline {
    fn default() -> Self {
        Self::from_config(&TattooConfig::default())
    }
}

impl PlacementPipeline {
    /// Create an empty pipeline. Targets and canvases are added through
    /// `registry_mut`.
    pub fn from_config(config: &TattooConfig) -> Self {
        Self {
            registry: SurfaceTargetRegistry::new(),
            session: PlacementSession::from_config(config),
            raycast: RaycastOptions::from(&config.raycast),
            stamp_base_size: config.stamp.base_size,
            decal_half_extents: Vec3::from_array(config.decal.half_extents),
            surface_bias: config.decal.surface_bias,
        }
    }

    pub fn registry(&self) -> &SurfaceTargetRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SurfaceTargetRegistry {
        &mut self.registry
    }

    pub fn session(&self) -> &PlacementSession {
        &self.session
    }

    pub fn raycast_options(&self) -> RaycastOptions {
        self.raycast
    }

    pub fn set_raycast_options(&mut self, options: RaycastOptions) {
        self.raycast = options;
    }

    pub fn stamp_base_size(&self) -> f32 {
        self.stamp_base_size
    }

    pub fn decal_half_extents(&self) -> Vec3 {
        self.decal_half_extents
    }

    pub fn surface_bias(&self) -> f32 {
        self.surface_bias
    }

    /// Replace the tattoo image used by subsequent placements
    pub fn load_image(&mut self, image: TattooImage) -> Arc<TattooImage> {
        self.session.load_image(image)
    }

    pub fn request_arm(&mut self) -> Result<(), PlacementError> {
        self.session.request_arm()
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    pub fn set_size_scale(&mut self, scale: f32) -> Result<(), PlacementError> {
        self.session.set_size_scale(scale)
    }

    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.session.set_mode(mode);
    }

    pub fn set_repeat_placements(&mut self, repeat: bool) {
        self.session.set_repeat_placements(repeat);
    }

    /// Advance session timers by one frame
    pub fn advance(&mut self, dt: Duration) {
        self.session.advance(dt);
    }

    /// Restore every canvas to its base color. Decals are kept.
    pub fn reset(&mut self) {
        self.registry.reset();
        info!("Placement canvases reset");
    }

    pub fn clear_decals(&mut self) {
        self.registry.clear_decals();
    }
}
