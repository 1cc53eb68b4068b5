//! Surface target registry
//!
//! Owns everything a placement can touch: the target meshes with their
//! transforms, the paintable canvases they sample, and the decal meshes built
//! so far. A target samples a canvas only through an explicit
//! `SurfaceHandle`, which the renderer uses to bind the same texture.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Affine3A, Mat3A, Vec3};
use tracing::{debug, info};

use crate::canvas::CanvasTexture;
use crate::clipper::DecalMesh;
use crate::mesh::{Aabb, Mesh};
use crate::raycast::{RaycastOptions, raycast_mesh};
use crate::types::{DecalId, HitRecord, ObjectId, Ray, SurfaceHandle};
use crate::validation::PlacementError;

/// A registered mesh placed in the world
#[derive(Debug, Clone)]
pub struct SurfaceTarget {
    id: ObjectId,
    mesh: Arc<Mesh>,
    surface: Option<SurfaceHandle>,
    world_from_object: Affine3A,
    object_from_world: Affine3A,
    normal_to_world: Mat3A,
    world_bounds: Aabb,
}

impl SurfaceTarget {
    fn new(
        id: ObjectId,
        mesh: Arc<Mesh>,
        world_from_object: Affine3A,
        surface: Option<SurfaceHandle>,
    ) -> Self {
        let mut target = Self {
            id,
            world_bounds: Aabb::EMPTY,
            mesh,
            surface,
            world_from_object,
            object_from_world: Affine3A::IDENTITY,
            normal_to_world: Mat3A::IDENTITY,
        };
        target.set_transform(world_from_object);
        target
    }

    fn set_transform(&mut self, world_from_object: Affine3A) {
        self.world_from_object = world_from_object;
        self.object_from_world = world_from_object.inverse();
        self.normal_to_world = world_from_object.matrix3.inverse().transpose();
        self.world_bounds = self.mesh.bounds().transformed(&world_from_object);
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Canvas this target samples, if it is paintable
    #[inline]
    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    #[inline]
    pub fn world_from_object(&self) -> Affine3A {
        self.world_from_object
    }

    #[inline]
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Nearest hit of a world-space ray, reported in world space
    pub fn raycast(&self, ray: &Ray, options: RaycastOptions) -> Option<HitRecord> {
        if ray.is_degenerate() {
            return None;
        }

        // The object-space direction is left unnormalized so that `t` stays a
        // world-space distance.
        let origin = self.object_from_world.transform_point3(ray.origin);
        let direction = self.object_from_world.transform_vector3(ray.direction);
        let hit = raycast_mesh(origin, direction, &self.mesh, options)?;

        let to_world = |n: Vec3| (self.normal_to_world * n).normalize_or_zero();
        Some(HitRecord {
            point: self.world_from_object.transform_point3(hit.position),
            normal: to_world(hit.normal),
            face_normal: to_world(hit.face_normal),
            uv: hit.uv,
            barycentric: hit.barycentric,
            distance: hit.t,
            triangle_index: hit.triangle_index,
            object: self.id,
        })
    }
}

/// A decal mesh together with the id it was registered under
#[derive(Debug, Clone)]
pub struct RegisteredDecal {
    pub id: DecalId,
    pub mesh: DecalMesh,
}

/// Owner of targets, canvases and decals
#[derive(Debug, Default)]
pub struct SurfaceTargetRegistry {
    targets: Vec<SurfaceTarget>,
    canvases: HashMap<SurfaceHandle, CanvasTexture>,
    decals: Vec<RegisteredDecal>,
    /// Decals before this index have been handed to the renderer
    acknowledged_decals: usize,
    /// Decals were added or removed since the renderer last acknowledged
    decals_changed: bool,
    dirty: bool,
    next_object: u32,
    next_surface: u32,
    next_decal: u32,
}

impl SurfaceTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a paintable canvas and return its handle
    pub fn add_canvas(&mut self, canvas: CanvasTexture) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next_surface);
        self.next_surface += 1;
        info!(
            "Registered canvas {:?} ({}x{})",
            handle,
            canvas.width(),
            canvas.height()
        );
        self.canvases.insert(handle, canvas);
        handle
    }

    pub fn canvas(&self, handle: SurfaceHandle) -> Option<&CanvasTexture> {
        self.canvases.get(&handle)
    }

    pub fn canvas_mut(
        &mut self,
        handle: SurfaceHandle,
    ) -> Result<&mut CanvasTexture, PlacementError> {
        self.canvases
            .get_mut(&handle)
            .ok_or(PlacementError::UnknownSurface(handle))
    }

    pub fn canvas_handles(&self) -> impl Iterator<Item = SurfaceHandle> + '_ {
        self.canvases.keys().copied()
    }

    /// Register a mesh as a placement target.
    ///
    /// `surface`, if given, must be a registered canvas; the target's UVs
    /// address that canvas.
    pub fn add_target(
        &mut self,
        mesh: Arc<Mesh>,
        world_from_object: Affine3A,
        surface: Option<SurfaceHandle>,
    ) -> Result<ObjectId, PlacementError> {
        if let Some(handle) = surface
            && !self.canvases.contains_key(&handle)
        {
            return Err(PlacementError::UnknownSurface(handle));
        }

        let id = ObjectId(self.next_object);
        self.next_object += 1;
        info!(
            "Registered target {:?}: {} triangles, uvs={}, surface={:?}",
            id,
            mesh.triangle_count(),
            mesh.has_uvs(),
            surface
        );
        self.targets
            .push(SurfaceTarget::new(id, mesh, world_from_object, surface));
        Ok(id)
    }

    pub fn remove_target(&mut self, id: ObjectId) -> Result<SurfaceTarget, PlacementError> {
        let index = self
            .targets
            .iter()
            .position(|t| t.id == id)
            .ok_or(PlacementError::UnknownObject(id))?;
        Ok(self.targets.remove(index))
    }

    /// Move a target, e.g. when the model is rotated between placements
    pub fn set_transform(
        &mut self,
        id: ObjectId,
        world_from_object: Affine3A,
    ) -> Result<(), PlacementError> {
        let target = self
            .targets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(PlacementError::UnknownObject(id))?;
        target.set_transform(world_from_object);
        Ok(())
    }

    pub fn target(&self, id: ObjectId) -> Option<&SurfaceTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn targets(&self) -> &[SurfaceTarget] {
        &self.targets
    }

    /// Target a ray should be tested against: the one whose world bounds
    /// the ray enters first. With a single target that target is returned.
    pub fn current_target(&self, ray: &Ray) -> Option<&SurfaceTarget> {
        if let [only] = self.targets.as_slice() {
            return Some(only);
        }

        let mut best: Option<(f32, &SurfaceTarget)> = None;
        for target in &self.targets {
            if let Some(t) = target.world_bounds.ray_entry(ray.origin, ray.direction)
                && best.is_none_or(|(best_t, _)| t < best_t)
            {
                best = Some((t, target));
            }
        }
        best.map(|(_, target)| target)
    }

    /// Nearest hit across all targets. Equal distances resolve to the
    /// earlier-registered target.
    pub fn raycast(&self, ray: &Ray, options: RaycastOptions) -> Option<HitRecord> {
        let mut best: Option<HitRecord> = None;
        for target in &self.targets {
            if let Some(hit) = target.raycast(ray, options)
                && best.is_none_or(|b| hit.distance < b.distance)
            {
                best = Some(hit);
            }
        }
        best
    }

    /// Store a new decal; it stays pending until the next `clear_dirty`
    pub fn add_decal(&mut self, mesh: DecalMesh) -> DecalId {
        let id = DecalId(self.next_decal);
        self.next_decal += 1;
        debug!(
            "Registered decal {:?}: {} triangles",
            id,
            mesh.triangle_count()
        );
        self.decals.push(RegisteredDecal { id, mesh });
        self.decals_changed = true;
        self.mark_dirty();
        id
    }

    pub fn decals(&self) -> &[RegisteredDecal] {
        &self.decals
    }

    pub fn decal(&self, id: DecalId) -> Option<&DecalMesh> {
        self.decals.iter().find(|d| d.id == id).map(|d| &d.mesh)
    }

    /// Decals created since the renderer last acknowledged
    pub fn pending_decals(&self) -> &[RegisteredDecal] {
        &self.decals[self.acknowledged_decals.min(self.decals.len())..]
    }

    /// Remove every decal. Canvases are left alone.
    pub fn clear_decals(&mut self) {
        if !self.decals.is_empty() {
            info!("Cleared {} decals", self.decals.len());
        }
        self.decals.clear();
        self.acknowledged_decals = 0;
        self.decals_changed = true;
        self.mark_dirty();
    }

    /// Flag that the renderer has something to pick up
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge that the renderer consumed the current state
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
        self.decals_changed = false;
        self.acknowledged_decals = self.decals.len();
    }

    /// Restore every canvas to its base color.
    ///
    /// The dirty flag is cleared unless decal changes are still waiting for
    /// the renderer; decals are not touched by a reset.
    pub fn reset(&mut self) {
        for canvas in self.canvases.values_mut() {
            canvas.reset();
        }
        self.dirty = self.decals_changed;
        info!("Reset {} canvases", self.canvases.len());
    }
}
