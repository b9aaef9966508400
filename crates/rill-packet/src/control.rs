//! # Feedback Report Wire Format
//!
//! Control endpoints exchange compact reports instead of media: the sender
//! emits stream reports describing what it has sent, and receivers answer
//! with reception reports that feed the sender's loss and rate tracking.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=1|    RT     |   reserved    |       Body Length (16)        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Body ...                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::composer::{ComposeError, Composer};
use crate::packet::Packet;
use crate::parser::{ParseError, Parser};

// ─── Constants ──────────────────────────────────────────────────────────────

/// Control wire version.
pub const CONTROL_VERSION: u8 = 1;

/// Fixed report header size in bytes.
pub const CONTROL_HEADER_SIZE: usize = 4;

const RT_SENDER_REPORT: u8 = 0x01;
const RT_RECEIVER_REPORT: u8 = 0x02;

const SENDER_REPORT_BODY: usize = 28;
const RECEIVER_REPORT_BODY: usize = 21;

// ─── Reports ────────────────────────────────────────────────────────────────

/// Sender-side stream report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderReport {
    /// Stream being reported on.
    pub stream: u32,
    /// Wallclock at report generation, µs.
    pub wallclock_us: u64,
    /// Media timestamp corresponding to `wallclock_us`.
    pub timestamp: u32,
    /// Media packets sent so far.
    pub packet_count: u32,
    /// Media payload bytes sent so far.
    pub byte_count: u64,
}

/// Receiver-side reception report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Stream identifier of the reporting receiver.
    pub reporter: u32,
    /// Stream being reported on.
    pub stream: u32,
    /// Fraction of packets lost since the previous report, Q8.
    pub fraction_lost: u8,
    /// Packets lost since the stream began.
    pub cumulative_lost: u32,
    /// Highest sequence number received, extended past u16 wrap.
    pub highest_seq: u32,
    /// Interarrival jitter, µs.
    pub jitter_us: u32,
}

/// A decoded control report, either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReport {
    Sender(SenderReport),
    Receiver(ReceiverReport),
}

impl ControlReport {
    fn report_type(&self) -> u8 {
        match self {
            ControlReport::Sender(_) => RT_SENDER_REPORT,
            ControlReport::Receiver(_) => RT_RECEIVER_REPORT,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            ControlReport::Sender(_) => SENDER_REPORT_BODY,
            ControlReport::Receiver(_) => RECEIVER_REPORT_BODY,
        }
    }

    /// Total encoded size, header included.
    pub fn wire_len(&self) -> usize {
        CONTROL_HEADER_SIZE + self.body_len()
    }

    /// Encode header + body into a buffer.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8((CONTROL_VERSION << 6) | self.report_type());
        buf.put_u8(0);
        buf.put_u16(self.body_len() as u16);
        match self {
            ControlReport::Sender(sr) => {
                buf.put_u32(sr.stream);
                buf.put_u64(sr.wallclock_us);
                buf.put_u32(sr.timestamp);
                buf.put_u32(sr.packet_count);
                buf.put_u64(sr.byte_count);
            }
            ControlReport::Receiver(rr) => {
                buf.put_u32(rr.reporter);
                buf.put_u32(rr.stream);
                buf.put_u8(rr.fraction_lost);
                buf.put_u32(rr.cumulative_lost);
                buf.put_u32(rr.highest_seq);
                buf.put_u32(rr.jitter_us);
            }
        }
    }

    /// Decode one report, advancing the buffer past it.
    pub fn decode(buf: &mut impl Buf) -> Result<ControlReport, ParseError> {
        if buf.remaining() < CONTROL_HEADER_SIZE {
            return Err(ParseError::Truncated {
                need: CONTROL_HEADER_SIZE,
                have: buf.remaining(),
            });
        }
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != CONTROL_VERSION {
            return Err(ParseError::BadVersion(version));
        }
        let rt = b0 & 0x3F;
        buf.advance(1); // reserved
        let body_len = buf.get_u16() as usize;
        if buf.remaining() < body_len {
            return Err(ParseError::Truncated {
                need: body_len,
                have: buf.remaining(),
            });
        }

        let expected = match rt {
            RT_SENDER_REPORT => SENDER_REPORT_BODY,
            RT_RECEIVER_REPORT => RECEIVER_REPORT_BODY,
            other => return Err(ParseError::UnknownReport(other)),
        };
        if body_len != expected {
            return Err(ParseError::LengthMismatch {
                expected,
                actual: body_len,
            });
        }

        Ok(match rt {
            RT_SENDER_REPORT => ControlReport::Sender(SenderReport {
                stream: buf.get_u32(),
                wallclock_us: buf.get_u64(),
                timestamp: buf.get_u32(),
                packet_count: buf.get_u32(),
                byte_count: buf.get_u64(),
            }),
            _ => ControlReport::Receiver(ReceiverReport {
                reporter: buf.get_u32(),
                stream: buf.get_u32(),
                fraction_lost: buf.get_u8(),
                cumulative_lost: buf.get_u32(),
                highest_seq: buf.get_u32(),
                jitter_us: buf.get_u32(),
            }),
        })
    }
}

// ─── Control Composer ───────────────────────────────────────────────────────

/// Composer for outbound control reports.
#[derive(Debug, Default)]
pub struct ControlComposer;

impl ControlComposer {
    pub fn new() -> Self {
        ControlComposer
    }
}

impl Composer for ControlComposer {
    fn overhead(&self) -> usize {
        CONTROL_HEADER_SIZE
    }

    fn compose(&mut self, packet: &mut Packet) -> Result<(), ComposeError> {
        let report = packet
            .control
            .as_ref()
            .ok_or(ComposeError::MissingMetadata("control"))?;
        let mut buf = BytesMut::with_capacity(report.wire_len());
        report.encode(&mut buf);
        packet.data = buf.freeze();
        Ok(())
    }
}

// ─── Control Parser ─────────────────────────────────────────────────────────

/// Parser for inbound control reports.
#[derive(Debug, Default)]
pub struct ControlParser;

impl ControlParser {
    pub fn new() -> Self {
        ControlParser
    }
}

impl Parser for ControlParser {
    fn parse(&self, packet: &mut Packet) -> Result<(), ParseError> {
        let mut wire = packet.data.clone();
        packet.control = Some(ControlReport::decode(&mut wire)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn receiver_report() -> ControlReport {
        ControlReport::Receiver(ReceiverReport {
            reporter: 9,
            stream: 1,
            fraction_lost: 13,
            cumulative_lost: 42,
            highest_seq: 70_000,
            jitter_us: 250,
        })
    }

    fn sender_report() -> ControlReport {
        ControlReport::Sender(SenderReport {
            stream: 1,
            wallclock_us: 1_700_000_000_000_000,
            timestamp: 96_000,
            packet_count: 200,
            byte_count: 240_000,
        })
    }

    #[test]
    fn reports_roundtrip() {
        for report in [sender_report(), receiver_report()] {
            let mut buf = BytesMut::new();
            report.encode(&mut buf);
            assert_eq!(buf.len(), report.wire_len());
            let decoded = ControlReport::decode(&mut buf.freeze()).unwrap();
            assert_eq!(decoded, report);
        }
    }

    #[test]
    fn decode_rejects_truncated_body() {
        let mut buf = BytesMut::new();
        receiver_report().encode(&mut buf);
        let wire = buf.freeze();
        let mut short = wire.slice(..wire.len() - 5);
        assert!(matches!(
            ControlReport::decode(&mut short),
            Err(ParseError::Truncated { .. })
        ));
    }

    #[test]
    fn decode_rejects_unknown_report_type() {
        let mut buf = BytesMut::new();
        buf.put_u8((CONTROL_VERSION << 6) | 0x3F);
        buf.put_u8(0);
        buf.put_u16(0);
        assert_eq!(
            ControlReport::decode(&mut buf.freeze()),
            Err(ParseError::UnknownReport(0x3F))
        );
    }

    #[test]
    fn decode_rejects_mismatched_body_length() {
        let mut buf = BytesMut::new();
        buf.put_u8((CONTROL_VERSION << 6) | RT_RECEIVER_REPORT);
        buf.put_u8(0);
        buf.put_u16(SENDER_REPORT_BODY as u16); // wrong body size for RR
        buf.extend_from_slice(&[0u8; SENDER_REPORT_BODY]);
        assert!(matches!(
            ControlReport::decode(&mut buf.freeze()),
            Err(ParseError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn composer_encodes_attached_report() {
        let mut composer = ControlComposer::new();
        let mut pkt = Packet::control(receiver_report());
        composer.compose(&mut pkt).unwrap();
        assert_eq!(pkt.wire_len(), CONTROL_HEADER_SIZE + RECEIVER_REPORT_BODY);
    }

    #[test]
    fn composer_requires_control_metadata() {
        let mut composer = ControlComposer::new();
        let mut pkt = Packet::inbound(Bytes::new());
        assert_eq!(
            composer.compose(&mut pkt),
            Err(ComposeError::MissingMetadata("control"))
        );
    }

    #[test]
    fn parser_fills_control_slot() {
        let mut buf = BytesMut::new();
        receiver_report().encode(&mut buf);
        let mut pkt = Packet::inbound(buf.freeze());

        let parser = ControlParser::new();
        parser.parse(&mut pkt).unwrap();
        assert_eq!(pkt.control, Some(receiver_report()));
    }

    #[test]
    fn parser_reports_garbage() {
        let parser = ControlParser::new();
        let mut pkt = Packet::inbound(Bytes::from_static(b"\xFF\xFF\xFF\xFF\xFF"));
        assert!(parser.parse(&mut pkt).is_err());
        assert!(pkt.control.is_none());
    }
}
