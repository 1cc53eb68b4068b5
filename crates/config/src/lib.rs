//! Shared configuration for tattlab
//!
//! This crate is the single source of truth for every tunable used by the
//! placement engine: canvas dimensions and fill color, stamp size, decal box
//! extents and surface bias, and the arming delay of the placement session.
//!
//! The canvas stamp size (pixels) and the decal box extents (world units) are
//! configured independently; nothing converts one into the other.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "TATTLAB_CONFIG";

/// Default canvas width in pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 1024;

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1024;

/// Default canvas fill (opaque white)
pub const DEFAULT_BASE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Default tile size for dirty-region tracking
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// Stamp edge length in pixels at a size scale of 1.0
pub const DEFAULT_STAMP_BASE_SIZE: f32 = 100.0;

/// Default decal box half-extents in world units (x, y, depth)
pub const DEFAULT_DECAL_HALF_EXTENTS: [f32; 3] = [0.12, 0.08, 0.1];

/// Outward offset of the decal box along the surface normal, in world units
pub const DEFAULT_SURFACE_BIAS: f32 = 0.02;

/// Delay between an arm request and the session accepting placements
pub const DEFAULT_ARM_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How a placement is authored once the session is armed and a ray hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Paint into the shared UV canvas (requires UVs on the hit mesh)
    Canvas,
    /// Build clipped decal geometry
    Decal,
    /// Paint when the hit carries a UV, otherwise build a decal
    #[default]
    Auto,
}

/// Paintable canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Fill color used at creation and on reset (straight RGBA, 0-1)
    pub base_color: [f32; 4],
    /// Tile edge length for dirty-region uploads
    pub tile_size: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            base_color: DEFAULT_BASE_COLOR,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// UV canvas stamp settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    /// Stamp edge length in pixels at scale 1.0
    pub base_size: f32,
    /// Initial size scale
    pub size_scale: f32,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            base_size: DEFAULT_STAMP_BASE_SIZE,
            size_scale: 1.0,
        }
    }
}

/// Box-clipped decal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecalConfig {
    /// Half-extents of the clip box in world units
    pub half_extents: [f32; 3],
    /// Outward offset of the box centre along the hit normal
    pub surface_bias: f32,
}

impl Default for DecalConfig {
    fn default() -> Self {
        Self {
            half_extents: DEFAULT_DECAL_HALF_EXTENTS,
            surface_bias: DEFAULT_SURFACE_BIAS,
        }
    }
}

/// Placement session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cooldown between an arm request and arming, in milliseconds
    pub arm_delay_ms: u64,
    /// Stay armed after a successful placement
    pub repeat_placements: bool,
    /// Authoring technique
    pub mode: PlacementMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arm_delay_ms: DEFAULT_ARM_DELAY_MS,
            repeat_placements: false,
            mode: PlacementMode::Auto,
        }
    }
}

/// Ray casting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaycastConfig {
    /// Test every triangle without a bounds pre-check
    pub test_all_triangles: bool,
    /// Ignore triangles facing away from the ray
    pub cull_back_faces: bool,
}

impl Default for RaycastConfig {
    fn default() -> Self {
        Self {
            test_all_triangles: true,
            cull_back_faces: false,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TattooConfig {
    pub canvas: CanvasConfig,
    pub stamp: StampConfig,
    pub decal: DecalConfig,
    pub session: SessionConfig,
    pub raycast: RaycastConfig,
}

impl TattooConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Load from the file named by `TATTLAB_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => {
                tracing::info!("Loading config from {}", path);
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Invalid {
                field: "canvas",
                reason: format!(
                    "dimensions must be non-zero, got {}x{}",
                    self.canvas.width, self.canvas.height
                ),
            });
        }
        if self.canvas.tile_size == 0 {
            return Err(ConfigError::Invalid {
                field: "canvas.tile_size",
                reason: "must be non-zero".to_string(),
            });
        }
        if !(self.stamp.base_size > 0.0 && self.stamp.base_size.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "stamp.base_size",
                reason: format!("must be positive, got {}", self.stamp.base_size),
            });
        }
        if !(self.stamp.size_scale > 0.0 && self.stamp.size_scale.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "stamp.size_scale",
                reason: format!("must be positive, got {}", self.stamp.size_scale),
            });
        }
        if self
            .decal
            .half_extents
            .iter()
            .any(|e| !(*e > 0.0 && e.is_finite()))
        {
            return Err(ConfigError::Invalid {
                field: "decal.half_extents",
                reason: format!("must all be positive, got {:?}", self.decal.half_extents),
            });
        }
        if !self.decal.surface_bias.is_finite() {
            return Err(ConfigError::Invalid {
                field: "decal.surface_bias",
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Arm delay as a `Duration`
    pub fn arm_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.session.arm_delay_ms)
    }
}
