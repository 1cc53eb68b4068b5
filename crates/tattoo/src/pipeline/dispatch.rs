//! Command application

use tracing::{debug, warn};

use super::{PlacementOutcome, PlacementPipeline};
use crate::commands::{CommandReceiver, PlacementCommand};
use crate::validation::PlacementError;

impl PlacementPipeline {
    /// Apply one queued command
    pub fn apply(&mut self, command: PlacementCommand) -> Result<PlacementOutcome, PlacementError> {
        match command {
            PlacementCommand::Pointer(ray) => return self.handle_pointer(&ray),
            PlacementCommand::LoadImage(image) => {
                self.load_image(image);
            }
            PlacementCommand::RequestArm => self.request_arm()?,
            PlacementCommand::Cancel => self.cancel(),
            PlacementCommand::SetSizeScale(scale) => self.set_size_scale(scale)?,
            PlacementCommand::SetMode(mode) => self.set_mode(mode),
            PlacementCommand::SetRepeat(repeat) => self.set_repeat_placements(repeat),
            PlacementCommand::SetTransform {
                object,
                world_from_object,
            } => self.registry.set_transform(object, world_from_object)?,
            PlacementCommand::Reset => self.reset(),
            PlacementCommand::ClearDecals => self.clear_decals(),
            PlacementCommand::Advance(dt) => self.advance(dt),
        }
        Ok(PlacementOutcome::StateChanged)
    }

    /// Apply every command queued before the call, in arrival order.
    ///
    /// Commands that arrive while the batch is applied wait for the next
    /// drain. Failures do not stop the drain; each command's result is
    /// returned in the same order.
    pub fn drain(
        &mut self,
        commands: &CommandReceiver,
    ) -> Vec<Result<PlacementOutcome, PlacementError>> {
        let results: Vec<_> = commands
            .pending()
            .into_iter()
            .map(|command| {
                let result = self.apply(command);
                if let Err(e) = &result {
                    warn!("Command failed: {}", e);
                }
                result
            })
            .collect();
        if !results.is_empty() {
            debug!("Drained {} placement commands", results.len());
        }
        results
    }
}
