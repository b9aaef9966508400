//! # FEC Source Framing
//!
//! Wraps a nested composer's output with an 8-byte trailer locating the
//! packet inside its FEC source block:
//!
//! ```text
//! | nested wire image ... | block (16) | symbol (16) | blk len (16) | payload len (16) |
//! ```
//!
//! Only the framing lives here — repair generation is the FEC encoder's job
//! and happens elsewhere in the sender. The composer assigns block and
//! symbol positions itself, rolling to the next block every `block_len`
//! packets.

use bytes::{BufMut, BytesMut};

use crate::composer::{ComposeError, Composer};
use crate::packet::{FecInfo, Packet};
use crate::parser::ParseError;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Bytes the source trailer adds after the nested wire image.
pub const FEC_SOURCE_OVERHEAD: usize = 8;

/// Default source symbols per block.
pub const DEFAULT_BLOCK_LEN: u16 = 20;

// ─── Trailer ────────────────────────────────────────────────────────────────

/// Decoded source trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecTrailer {
    /// Position of the packet within its source block.
    pub info: FecInfo,
    /// Length of the protected payload in bytes.
    pub payload_len: u16,
}

impl FecTrailer {
    /// Read the trailer off the end of a wire image.
    pub fn read_from(data: &[u8]) -> Result<FecTrailer, ParseError> {
        if data.len() < FEC_SOURCE_OVERHEAD {
            return Err(ParseError::Truncated {
                need: FEC_SOURCE_OVERHEAD,
                have: data.len(),
            });
        }
        let t = &data[data.len() - FEC_SOURCE_OVERHEAD..];
        Ok(FecTrailer {
            info: FecInfo {
                block: u16::from_be_bytes([t[0], t[1]]),
                symbol: u16::from_be_bytes([t[2], t[3]]),
                block_len: u16::from_be_bytes([t[4], t[5]]),
            },
            payload_len: u16::from_be_bytes([t[6], t[7]]),
        })
    }
}

// ─── FEC Source Composer ────────────────────────────────────────────────────

/// FEC source framing wrapped around a nested composer.
///
/// The wrapper is the externally visible composer of the chain; the base
/// media composer is nested inside it and runs first.
#[derive(Debug)]
pub struct FecSourceComposer<C> {
    inner: C,
    block_len: u16,
    block: u16,
    symbol: u16,
}

impl<C: Composer> FecSourceComposer<C> {
    /// Wrap `inner` with the default block length.
    pub fn new(inner: C) -> Self {
        Self::with_block_len(inner, DEFAULT_BLOCK_LEN)
    }

    /// Wrap `inner`, emitting `block_len` source symbols per block.
    pub fn with_block_len(inner: C, block_len: u16) -> Self {
        assert!(block_len > 0, "FEC block length must be > 0");
        FecSourceComposer {
            inner,
            block_len,
            block: 0,
            symbol: 0,
        }
    }

    /// The nested composer.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Composer> Composer for FecSourceComposer<C> {
    fn overhead(&self) -> usize {
        self.inner.overhead() + FEC_SOURCE_OVERHEAD
    }

    fn compose(&mut self, packet: &mut Packet) -> Result<(), ComposeError> {
        self.inner.compose(packet)?;
        if packet.payload.len() > u16::MAX as usize {
            return Err(ComposeError::PayloadTooLarge {
                len: packet.payload.len(),
                max: u16::MAX as usize,
            });
        }

        let info = FecInfo {
            block: self.block,
            symbol: self.symbol,
            block_len: self.block_len,
        };

        let mut buf = BytesMut::with_capacity(packet.data.len() + FEC_SOURCE_OVERHEAD);
        buf.extend_from_slice(&packet.data);
        buf.put_u16(info.block);
        buf.put_u16(info.symbol);
        buf.put_u16(info.block_len);
        buf.put_u16(packet.payload.len() as u16);
        packet.data = buf.freeze();
        packet.fec = Some(info);

        self.symbol += 1;
        if self.symbol == self.block_len {
            self.symbol = 0;
            self.block = self.block.wrapping_add(1);
        }
        Ok(())
    }
}
