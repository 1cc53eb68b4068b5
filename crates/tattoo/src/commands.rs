//! Placement command queue
//!
//! Input can originate on any thread (UI callbacks, file loaders). Commands
//! are queued here and applied by the thread that owns the pipeline, once
//! per frame, in arrival order.

use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use glam::Affine3A;
use tattlab_config::PlacementMode;

use crate::tattoo_image::TattooImage;
use crate::types::{ObjectId, Ray};

/// A single queued request against the placement pipeline
#[derive(Debug, Clone)]
pub enum PlacementCommand {
    /// Replace the current tattoo image
    LoadImage(TattooImage),
    /// Arm the next placement (after the configured delay)
    RequestArm,
    /// Drop a pending or armed placement
    Cancel,
    SetSizeScale(f32),
    SetMode(PlacementMode),
    SetRepeat(bool),
    /// Move a registered target
    SetTransform {
        object: ObjectId,
        world_from_object: Affine3A,
    },
    /// A pointer action, already turned into a world-space ray
    Pointer(Ray),
    /// Restore every canvas to its base color
    Reset,
    /// Remove all decal meshes
    ClearDecals,
    /// Frame time elapsed
    Advance(Duration),
}

/// Cloneable, thread-safe sending half of the queue
#[derive(Debug, Clone)]
pub struct CommandSender {
    sender: mpsc::Sender<PlacementCommand>,
    /// Commands successfully queued, shared with the receiver
    queued: Arc<AtomicUsize>,
}

impl CommandSender {
    /// Queue a command. Fails only when the receiving side was dropped; the
    /// command is handed back in that case.
    pub fn send(&self, command: PlacementCommand) -> Result<(), mpsc::SendError<PlacementCommand>> {
        self.sender.send(command)?;
        self.queued.fetch_add(1, Ordering::Release);
        Ok(())
    }
}

/// Receiving half, owned alongside the pipeline
#[derive(Debug)]
pub struct CommandReceiver {
    receiver: mpsc::Receiver<PlacementCommand>,
    queued: Arc<AtomicUsize>,
    received: Cell<usize>,
}

impl CommandReceiver {
    /// Everything queued before this call, without blocking.
    ///
    /// Commands sent while the batch is being taken are left for the next
    /// call, so a busy producer cannot stretch one batch indefinitely.
    pub fn pending(&self) -> Vec<PlacementCommand> {
        let available = self
            .queued
            .load(Ordering::Acquire)
            .saturating_sub(self.received.get());
        let batch: Vec<_> = self.receiver.try_iter().take(available).collect();
        self.received.set(self.received.get() + batch.len());
        batch
    }
}

/// Create a connected sender/receiver pair
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (sender, receiver) = mpsc::channel();
    let queued = Arc::new(AtomicUsize::new(0));
    (
        CommandSender {
            sender,
            queued: Arc::clone(&queued),
        },
        CommandReceiver {
            receiver,
            queued,
            received: Cell::new(0),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (tx, rx) = command_channel();
        tx.send(PlacementCommand::RequestArm).unwrap();
        tx.send(PlacementCommand::SetSizeScale(2.0)).unwrap();
        tx.send(PlacementCommand::Cancel).unwrap();

        let received = rx.pending();
        assert!(matches!(received[0], PlacementCommand::RequestArm));
        assert!(matches!(received[1], PlacementCommand::SetSizeScale(s) if s == 2.0));
        assert!(matches!(received[2], PlacementCommand::Cancel));
        assert!(rx.pending().is_empty());
    }

    #[test]
    fn test_send_from_other_thread() {
        let (tx, rx) = command_channel();
        let worker = tx.clone();
        std::thread::spawn(move || {
            worker.send(PlacementCommand::Reset).unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(rx.pending().len(), 1);
    }

    #[test]
    fn test_pending_is_bounded_by_busy_producer() {
        let (tx, rx) = command_channel();
        tx.send(PlacementCommand::Cancel).unwrap();
        let worker = tx.clone();
        // Sends until the receiver goes away
        let producer = std::thread::spawn(move || {
            let mut sent = 0usize;
            while worker.send(PlacementCommand::Reset).is_ok() {
                sent += 1;
            }
            sent
        });

        let first = rx.pending();
        assert!(!first.is_empty());
        assert!(matches!(first[0], PlacementCommand::Cancel));
        let second = rx.pending();

        drop(rx);
        let sent = producer.join().unwrap();
        assert!(first.len() + second.len() <= sent + 1);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = command_channel();
        drop(rx);
        assert!(tx.send(PlacementCommand::Reset).is_err());
    }
}
