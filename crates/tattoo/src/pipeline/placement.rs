//! Pointer handling: ray cast, then paint or clip

use std::sync::Arc;

use tattlab_config::PlacementMode;
use tracing::{debug, info, warn};

use super::{PlacementOutcome, PlacementPipeline};
use crate::clipper::clip_mesh;
use crate::painter::paint_tattoo;
use crate::projection::descriptor_from_hit;
use crate::tattoo_image::TattooImage;
use crate::types::{HitRecord, Ray};
use crate::validation::PlacementError;

impl PlacementPipeline {
    /// Handle a pointer action that has been turned into a world-space ray.
    ///
    /// When the session is not armed this is a no-op. Otherwise the nearest
    /// hit receives one placement and the session returns to idle (unless
    /// repeat placements are enabled).
    ///
    /// # Errors
    /// * `NoIntersection` if the ray misses every target; the session stays
    ///   armed so the next ray can try again
    /// * `MissingUv` if canvas mode was forced on a target that cannot be
    ///   painted. The session stays armed even though the ray hit something:
    ///   only a hit that places a tattoo (or an empty decal) consumes the arm.
    pub fn handle_pointer(&mut self, ray: &Ray) -> Result<PlacementOutcome, PlacementError> {
        if !self.session.is_armed() {
            debug!("Pointer ignored: session {:?}", self.session.state());
            return Ok(PlacementOutcome::Ignored);
        }
        let image = self
            .session
            .image()
            .cloned()
            .ok_or(PlacementError::NoImageLoaded)?;

        let Some(hit) = self.registry.raycast(ray, self.raycast) else {
            debug!("Pointer ray missed every target");
            return Err(PlacementError::NoIntersection);
        };

        let outcome = self.place(&hit, image)?;
        self.session.complete_placement();
        Ok(outcome)
    }

    /// Perform one placement at `hit` regardless of session state
    pub fn place(
        &mut self,
        hit: &HitRecord,
        image: Arc<TattooImage>,
    ) -> Result<PlacementOutcome, PlacementError> {
        let target = self
            .registry
            .target(hit.object)
            .ok_or(PlacementError::UnknownObject(hit.object))?;
        let paintable = hit.uv.is_some() && target.surface().is_some();

        match self.session.mode() {
            PlacementMode::Canvas => self.paint(hit, &image),
            PlacementMode::Decal => self.clip(hit, image),
            PlacementMode::Auto if paintable => self.paint(hit, &image),
            PlacementMode::Auto => self.clip(hit, image),
        }
    }

    /// A target with no canvas has nothing its UVs could address, so it is
    /// reported the same as a target without UVs.
    fn paint(
        &mut self,
        hit: &HitRecord,
        image: &TattooImage,
    ) -> Result<PlacementOutcome, PlacementError> {
        let surface = self
            .registry
            .target(hit.object)
            .and_then(|t| t.surface())
            .ok_or_else(|| {
                warn!("Target {:?} has no paintable surface", hit.object);
                PlacementError::MissingUv
            })?;

        let base_size = self.stamp_base_size;
        let size_scale = self.session.size_scale();
        let canvas = self.registry.canvas_mut(surface)?;
        let region = paint_tattoo(canvas, hit.uv, image, base_size, size_scale)?;
        self.registry.mark_dirty();

        info!(
            "Painted tattoo on {:?} at uv {:?} -> {:?}",
            hit.object, hit.uv, region
        );
        Ok(PlacementOutcome::Painted {
            object: hit.object,
            surface,
            region,
        })
    }

    fn clip(
        &mut self,
        hit: &HitRecord,
        image: Arc<TattooImage>,
    ) -> Result<PlacementOutcome, PlacementError> {
        let (mesh, world_from_object) = self
            .registry
            .target(hit.object)
            .map(|t| (t.mesh().clone(), t.world_from_object()))
            .ok_or(PlacementError::UnknownObject(hit.object))?;

        let normal = if hit.normal.length_squared() > 0.0 {
            hit.normal
        } else {
            hit.face_normal
        };
        let descriptor = descriptor_from_hit(
            hit.point,
            normal,
            self.decal_half_extents,
            self.surface_bias,
        );

        match clip_mesh(&mesh, world_from_object, &descriptor, image) {
            Ok(decal) => {
                let triangles = decal.triangle_count();
                let id = self.registry.add_decal(decal);
                info!(
                    "Placed decal {:?} on {:?}: {} triangles",
                    id, hit.object, triangles
                );
                Ok(PlacementOutcome::Decal {
                    object: hit.object,
                    id,
                    triangles,
                })
            }
            Err(PlacementError::EmptyClipResult) => {
                warn!(
                    "Decal box at {:?} enclosed no geometry; nothing placed",
                    descriptor.position
                );
                Ok(PlacementOutcome::Empty { object: hit.object })
            }
            Err(e) => Err(e),
        }
    }
}
