//! # Parser Stage
//!
//! Decoding side of the pipeline: a parser turns a received wire image back
//! into protocol-neutral fields. Parse failures are per-packet; the caller
//! drops the packet and keeps draining.

use thiserror::Error;

use crate::packet::Packet;

/// Per-packet failure of a decoding stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The wire image ends before the format says it should.
    #[error("wire image truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    /// The version bits do not match a version this parser speaks.
    #[error("unsupported wire version {0}")]
    BadVersion(u8),
    /// The report type field is not one this parser knows.
    #[error("unknown report type {0:#04x}")]
    UnknownReport(u8),
    /// The header's body length disagrees with the body itself.
    #[error("body length {actual} does not match header ({expected})")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A decoding stage of the inbound chain.
pub trait Parser: Send {
    /// Decode the packet's wire image into its protocol-neutral fields.
    fn parse(&self, packet: &mut Packet) -> Result<(), ParseError>;
}
