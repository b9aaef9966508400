//! # Packet Model
//!
//! The protocol-neutral unit moving through the sender pipeline. A packet is
//! owned by exactly one stage at a time and moves forward through the chain;
//! `Bytes` buffers make the hand-off cheap without sharing mutable state.

use bytes::Bytes;
use std::net::SocketAddr;

use crate::control::ControlReport;

// ─── Media Metadata ─────────────────────────────────────────────────────────

/// Media-stream metadata carried by packets on media endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// Stream identifier shared by all packets of one media stream.
    pub stream: u32,
    /// Per-stream sequence number.
    pub seq: u16,
    /// Media timestamp in sample-clock units.
    pub timestamp: u32,
    /// Payload type (0-31).
    pub payload_type: u8,
    /// Marker flag (frame boundary).
    pub marker: bool,
}

// ─── FEC Metadata ───────────────────────────────────────────────────────────

/// FEC framing position, stamped by the FEC source composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecInfo {
    /// Source block number.
    pub block: u16,
    /// Symbol index within the block.
    pub symbol: u16,
    /// Number of source symbols per block.
    pub block_len: u16,
}

// ─── Packet ─────────────────────────────────────────────────────────────────

/// A protocol-neutral packet.
///
/// Which metadata slots are populated depends on where the packet is in its
/// life: media packets carry [`MediaInfo`] from the session, the FEC stage
/// adds [`FecInfo`] as it frames them, control packets carry a
/// [`ControlReport`] in either direction, and raw inbound packets start with
/// nothing but `data`.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Media-stream metadata; present on media endpoint packets.
    pub media: Option<MediaInfo>,
    /// FEC framing position; stamped by the FEC source composer.
    pub fec: Option<FecInfo>,
    /// Control report; composed outbound or decoded inbound.
    pub control: Option<ControlReport>,
    /// Application payload. Empty for control packets.
    pub payload: Bytes,
    /// Composed or received wire image.
    pub data: Bytes,
    /// Destination address, stamped by the shipper.
    pub dest: Option<SocketAddr>,
}

impl Packet {
    /// A media packet ready for the outbound chain.
    pub fn media(info: MediaInfo, payload: Bytes) -> Self {
        Packet {
            media: Some(info),
            fec: None,
            control: None,
            payload,
            data: Bytes::new(),
            dest: None,
        }
    }

    /// A control packet carrying a report to compose.
    pub fn control(report: ControlReport) -> Self {
        Packet {
            media: None,
            fec: None,
            control: Some(report),
            payload: Bytes::new(),
            data: Bytes::new(),
            dest: None,
        }
    }

    /// A raw inbound packet as received from the network.
    pub fn inbound(data: Bytes) -> Self {
        Packet {
            media: None,
            fec: None,
            control: None,
            payload: Bytes::new(),
            data,
            dest: None,
        }
    }

    /// Length of the wire image in bytes.
    pub fn wire_len(&self) -> usize {
        self.data.len()
    }
}
