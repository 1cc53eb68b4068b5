//! Placement session state machine
//!
//! `Idle -> Cooldown -> Armed -> Idle`. The cooldown keeps the click that
//! requested arming from also counting as the placement gesture.

use std::sync::Arc;
use std::time::Duration;

use tattlab_config::{PlacementMode, TattooConfig};
use tracing::{debug, info};

use crate::tattoo_image::TattooImage;
use crate::validation::{PlacementError, validate_size_scale};

/// Where the session is in the arm/place cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Pointer events are ignored
    #[default]
    Idle,
    /// Arming was requested; becomes `Armed` once `remaining` elapses
    Cooldown { remaining: Duration },
    /// The next ray that hits a target performs a placement
    Armed,
}

/// Arming state plus the parameters of the next placement
#[derive(Debug, Clone)]
pub struct PlacementSession {
    state: SessionState,
    image: Option<Arc<TattooImage>>,
    size_scale: f32,
    arm_delay: Duration,
    repeat_placements: bool,
    mode: PlacementMode,
}

impl Default for PlacementSession {
    fn default() -> Self {
        Self::from_config(&TattooConfig::default())
    }
}

impl PlacementSession {
    pub fn from_config(config: &TattooConfig) -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            size_scale: config.stamp.size_scale,
            arm_delay: config.arm_delay(),
            repeat_placements: config.session.repeat_placements,
            mode: config.session.mode,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.state == SessionState::Armed
    }

    /// Replace the current tattoo image. Arming state is kept.
    pub fn load_image(&mut self, image: TattooImage) -> Arc<TattooImage> {
        info!("Loaded tattoo image {}x{}", image.width(), image.height());
        let image = Arc::new(image);
        self.image = Some(image.clone());
        image
    }

    pub fn image(&self) -> Option<&Arc<TattooImage>> {
        self.image.as_ref()
    }

    #[inline]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    #[inline]
    pub fn size_scale(&self) -> f32 {
        self.size_scale
    }

    /// Update the stamp scale. Rejected values leave the previous scale in
    /// place.
    pub fn set_size_scale(&mut self, scale: f32) -> Result<(), PlacementError> {
        self.size_scale = validate_size_scale(scale)?;
        debug!("Size scale set to {}", scale);
        Ok(())
    }

    #[inline]
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.mode = mode;
    }

    #[inline]
    pub fn repeat_placements(&self) -> bool {
        self.repeat_placements
    }

    pub fn set_repeat_placements(&mut self, repeat: bool) {
        self.repeat_placements = repeat;
    }

    #[inline]
    pub fn arm_delay(&self) -> Duration {
        self.arm_delay
    }

    /// Ask for the next pointer action to place the tattoo.
    ///
    /// With a zero delay the session arms immediately.
    ///
    /// # Errors
    /// `NoImageLoaded` if no image has been loaded; the state is unchanged.
    pub fn request_arm(&mut self) -> Result<(), PlacementError> {
        if self.image.is_none() {
            return Err(PlacementError::NoImageLoaded);
        }
        if self.state == SessionState::Armed {
            return Ok(());
        }

        self.state = if self.arm_delay.is_zero() {
            SessionState::Armed
        } else {
            SessionState::Cooldown {
                remaining: self.arm_delay,
            }
        };
        info!("Arm requested: {:?}", self.state);
        Ok(())
    }

    /// Drop any pending or armed placement
    pub fn cancel(&mut self) {
        if self.state != SessionState::Idle {
            debug!("Placement cancelled from {:?}", self.state);
        }
        self.state = SessionState::Idle;
    }

    /// Advance the cooldown clock by `dt`
    pub fn advance(&mut self, dt: Duration) {
        if let SessionState::Cooldown { remaining } = self.state {
            let remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                self.state = SessionState::Armed;
                info!("Session armed");
            } else {
                self.state = SessionState::Cooldown { remaining };
            }
        }
    }

    /// Record a completed placement
    pub fn complete_placement(&mut self) {
        if !self.repeat_placements {
            self.state = SessionState::Idle;
        }
    }
}
