//! # Composer Stage
//!
//! Encoding side of the pipeline: a composer turns a packet's
//! protocol-neutral fields into wire bytes, in place. Composers nest — a
//! wrapping stage composes the nested stage first, then adds its own framing
//! around the result.

use thiserror::Error;

use crate::packet::Packet;

/// Per-packet failure of an encoding stage.
///
/// Compose failures are never fatal to the endpoint: the packet is dropped
/// and the status is reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// The packet is missing the metadata this stage encodes.
    #[error("packet carries no {0} metadata")]
    MissingMetadata(&'static str),
    /// A metadata field does not fit its wire field.
    #[error("{0} is out of range for the wire format")]
    FieldOutOfRange(&'static str),
    /// The payload exceeds what the wire format can carry.
    #[error("payload of {len} bytes exceeds the wire limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

/// An encoding stage of the outbound chain.
pub trait Composer: Send {
    /// Framing bytes this stage adds around a payload, including any nested
    /// stage. Stable for the life of the chain, so the session can budget
    /// packet sizes at any time.
    fn overhead(&self) -> usize;

    /// Encode the packet's metadata and payload into its wire image.
    fn compose(&mut self, packet: &mut Packet) -> Result<(), ComposeError>;
}
