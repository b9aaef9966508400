//! # Media Wire Header
//!
//! Fixed 11-byte header carried by every media packet. The payload follows
//! immediately; datagram framing supplies the length.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=1|M|   PT    |        Sequence Number        |  Timestamp ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  ... (32)                       |          Stream ID (32) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::composer::{ComposeError, Composer};
use crate::packet::{MediaInfo, Packet};
use crate::parser::ParseError;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Media wire version.
pub const MEDIA_VERSION: u8 = 1;

/// Fixed media header size in bytes.
pub const MEDIA_HEADER_SIZE: usize = 11;

/// Highest payload type the 5-bit field can carry.
pub const MAX_PAYLOAD_TYPE: u8 = 0x1F;

// ─── Media Header ───────────────────────────────────────────────────────────

/// Decoded media header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHeader {
    /// Wire version (must be [`MEDIA_VERSION`]).
    pub version: u8,
    /// Marker flag (frame boundary).
    pub marker: bool,
    /// Payload type (0-31).
    pub payload_type: u8,
    /// Per-stream sequence number.
    pub seq: u16,
    /// Media timestamp in sample-clock units.
    pub timestamp: u32,
    /// Stream identifier.
    pub stream: u32,
}

impl MediaHeader {
    /// Build a header from packet metadata.
    pub fn from_info(info: &MediaInfo) -> Self {
        MediaHeader {
            version: MEDIA_VERSION,
            marker: info.marker,
            payload_type: info.payload_type,
            seq: info.seq,
            timestamp: info.timestamp,
            stream: info.stream,
        }
    }

    /// Encode into a buffer. Panics if the buffer lacks space.
    pub fn encode(&self, buf: &mut impl BufMut) {
        let mut b0 = (self.version & 0b11) << 6;
        if self.marker {
            b0 |= 1 << 5;
        }
        b0 |= self.payload_type & MAX_PAYLOAD_TYPE;
        buf.put_u8(b0);
        buf.put_u16(self.seq);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.stream);
    }

    /// Decode from a buffer, advancing it past the header.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, ParseError> {
        if buf.remaining() < MEDIA_HEADER_SIZE {
            return Err(ParseError::Truncated {
                need: MEDIA_HEADER_SIZE,
                have: buf.remaining(),
            });
        }
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != MEDIA_VERSION {
            return Err(ParseError::BadVersion(version));
        }
        Ok(MediaHeader {
            version,
            marker: b0 & (1 << 5) != 0,
            payload_type: b0 & MAX_PAYLOAD_TYPE,
            seq: buf.get_u16(),
            timestamp: buf.get_u32(),
            stream: buf.get_u32(),
        })
    }
}

// ─── Media Composer ─────────────────────────────────────────────────────────

/// Base media composer: header + payload → wire image.
#[derive(Debug, Default)]
pub struct MediaComposer;

impl MediaComposer {
    pub fn new() -> Self {
        MediaComposer
    }
}

impl Composer for MediaComposer {
    fn overhead(&self) -> usize {
        MEDIA_HEADER_SIZE
    }

    fn compose(&mut self, packet: &mut Packet) -> Result<(), ComposeError> {
        let info = packet
            .media
            .as_ref()
            .ok_or(ComposeError::MissingMetadata("media"))?;
        if info.payload_type > MAX_PAYLOAD_TYPE {
            return Err(ComposeError::FieldOutOfRange("payload type"));
        }

        let mut buf = BytesMut::with_capacity(MEDIA_HEADER_SIZE + packet.payload.len());
        MediaHeader::from_info(info).encode(&mut buf);
        buf.extend_from_slice(&packet.payload);
        packet.data = buf.freeze();
        Ok(())
    }
}
