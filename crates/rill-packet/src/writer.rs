//! # Packet Writer
//!
//! The sink seam shared across the pipeline: the endpoint's outbound entry
//! implements it, and so does the external transport writer the endpoint
//! ultimately forwards to. Keeping one trait at both seams lets stages and
//! transports compose without caring what sits behind them.

use thiserror::Error;

use crate::composer::ComposeError;
use crate::packet::Packet;

/// Submission status for a single packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// An encoding stage rejected the packet.
    #[error(transparent)]
    Compose(#[from] ComposeError),
    /// The transport declined the packet (e.g. temporarily unavailable).
    #[error("transport rejected packet: {0}")]
    Transport(String),
    /// The target endpoint was constructed invalid and has no data path.
    #[error("endpoint has no operational pipeline")]
    NotOperational,
}

/// A sink accepting fully formed packets.
///
/// Writes run synchronously on the caller's thread and must not block on
/// network I/O beyond what the implementation itself guarantees.
pub trait PacketWriter: Send {
    fn write(&mut self, packet: Packet) -> Result<(), WriteError>;
}
