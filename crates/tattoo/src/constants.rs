/// Epsilon for ray/triangle determinant and hit distance tests.
pub const RAY_EPSILON: f32 = 1e-6;

/// Minimum squared length for a vector to be treated as a direction.
pub const MIN_DIRECTION_LENGTH_SQ: f32 = 1e-12;

/// Slack applied to clip-plane distances so vertices lying on a box face
/// count as inside.
pub const CLIP_EPSILON: f32 = 1e-6;

/// Default tile size for canvas dirty tracking.
pub const DEFAULT_TILE_SIZE: u32 = tattlab_config::DEFAULT_TILE_SIZE;
