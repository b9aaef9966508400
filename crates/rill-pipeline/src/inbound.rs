//! # Inbound Hand-off
//!
//! Network threads hand raw feedback packets to the pipeline thread through
//! a bounded lock-free channel. Producers only enqueue — decoding happens on
//! the pipeline thread during a pull. Enqueueing never blocks: a full queue
//! surfaces as a status the network thread can count and drop on.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use thiserror::Error;

use rill_packet::packet::Packet;

use crate::state_tracker::ActivityTracker;

/// Default bound for one endpoint's inbound queue.
pub const INBOUND_QUEUE_CAPACITY: usize = 1024;

/// Enqueue status returned to the network thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    /// Queue at capacity; the packet was dropped by backpressure.
    #[error("inbound queue is full")]
    Full,
    /// The owning endpoint is gone.
    #[error("inbound queue is disconnected")]
    Disconnected,
}

/// Create the producer and consumer halves of an endpoint's inbound queue.
pub(crate) fn inbound_queue(
    tracker: Arc<dyn ActivityTracker>,
    capacity: usize,
) -> (InboundWriter, Receiver<Packet>) {
    let (tx, rx) = bounded(capacity);
    (InboundWriter { tx, tracker }, rx)
}

/// Producer handle for one endpoint's inbound queue.
///
/// Clonable and safe to use from any number of network threads without
/// external locking; per-producer FIFO order is preserved through the pull.
#[derive(Clone)]
pub struct InboundWriter {
    tx: Sender<Packet>,
    tracker: Arc<dyn ActivityTracker>,
}

impl InboundWriter {
    /// Enqueue one raw packet. Never blocks.
    pub fn write(&self, packet: Packet) -> Result<(), EnqueueError> {
        match self.tx.try_send(packet) {
            Ok(()) => {
                self.tracker.notify_pending(1);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(EnqueueError::Full),
            Err(TrySendError::Disconnected(_)) => Err(EnqueueError::Disconnected),
        }
    }
}
