//! Tattoo placement engine - surface decals for triangle meshes
//!
//! This crate turns a pointer ray and a decoded image into a tattoo on a mesh:
//! - [`raycast`] - Nearest ray/triangle hit with interpolated normal and UV
//! - [`painter`] - Stamps the image into a UV-space [`canvas`] texture
//! - [`clipper`] - Builds decal geometry by clipping the mesh against a box
//! - [`session`] - Arm/cooldown state machine for placements
//! - [`registry`] - Owns targets, canvases and decals for the renderer
//! - [`pipeline`] - Connects all of the above, driven directly or through
//!   the [`commands`] queue
//!
//! Renderer agnostic. The optional `bevy` feature adds mesh conversions.

#[cfg(feature = "bevy")]
pub mod bevy_mesh;
pub mod canvas;
pub mod clipper;
pub mod commands;
pub mod constants;
pub mod mesh;
pub mod painter;
pub mod pipeline;
pub mod projection;
pub mod raycast;
pub mod registry;
pub mod session;
pub mod surface;
pub mod tattoo_image;
pub mod types;
pub mod validation;

pub use canvas::{CanvasTexture, DirtyRegion, PixelRect, TileCoord};
pub use clipper::{DecalMesh, DecalVertex, clip_mesh};
pub use commands::{CommandReceiver, CommandSender, PlacementCommand, command_channel};
pub use mesh::{Aabb, Mesh, MeshError, Triangle};
pub use painter::paint_tattoo;
pub use pipeline::{PlacementOutcome, PlacementPipeline};
pub use projection::{DecalFrame, descriptor_from_hit};
pub use raycast::{RaycastOptions, raycast_mesh};
pub use registry::{RegisteredDecal, SurfaceTarget, SurfaceTargetRegistry};
pub use session::{PlacementSession, SessionState};
pub use surface::CpuSurface;
pub use tattlab_config::{PlacementMode, TattooConfig};
pub use tattoo_image::{ImageError, TattooImage};
pub use types::*;
pub use validation::PlacementError;
