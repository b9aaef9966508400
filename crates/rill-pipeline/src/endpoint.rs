//! # Sender Endpoint
//!
//! Per-endpoint sub-pipeline of the sender: one fixed outbound chain ending
//! in a shipper, an optional inbound parser, and the queue bridging packets
//! from the network threads into the pipeline thread.
//!
//! Construction resolves the protocol's capability set once and wires every
//! stage up front. Afterwards the endpoint has exactly two macro-states:
//! invalid (no pipeline, terminal) and valid (fixed pipeline, pure
//! request/response).
//!
//! Thread contract: construction, outbound writes, and pulls belong to the
//! single pipeline thread. Network threads touch the endpoint only through
//! the [`InboundWriter`] handle.

use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use thiserror::Error;
use tracing::{debug, warn};

use rill_packet::composer::{ComposeError, Composer};
use rill_packet::control::{ControlComposer, ControlParser};
use rill_packet::fec::FecSourceComposer;
use rill_packet::media::MediaComposer;
use rill_packet::packet::Packet;
use rill_packet::parser::{ParseError, Parser};
use rill_packet::shipper::Shipper;
use rill_packet::writer::{PacketWriter, WriteError};

use crate::inbound::{inbound_queue, InboundWriter, INBOUND_QUEUE_CAPACITY};
use crate::proto::Protocol;
use crate::state_tracker::ActivityTracker;
use crate::stats::EndpointStats;

// ─── Session Seam ───────────────────────────────────────────────────────────

/// The session's ingestion interface for decoded inbound packets.
///
/// Implementations are typically cheap handles into the owning session
/// (e.g. the sending half of its feedback queue), injected at endpoint
/// construction.
pub trait InboundRouter: Send {
    /// Accept one decoded packet pulled from an endpoint. `now_us` is the
    /// pull time, passed through for time-sensitive validation downstream.
    fn route_inbound(&mut self, packet: Packet, now_us: u64) -> Result<(), WriteError>;
}

// ─── Composer Stack ─────────────────────────────────────────────────────────

/// Top-level composer of an endpoint's outbound chain, resolved once at
/// construction from the capability table.
#[derive(Debug)]
pub enum ComposerStack {
    /// Base media composer alone.
    Media(MediaComposer),
    /// FEC source framing wrapped around the media composer.
    MediaFec(FecSourceComposer<MediaComposer>),
    /// Control report composer.
    Control(ControlComposer),
}

impl Composer for ComposerStack {
    fn overhead(&self) -> usize {
        match self {
            ComposerStack::Media(c) => c.overhead(),
            ComposerStack::MediaFec(c) => c.overhead(),
            ComposerStack::Control(c) => c.overhead(),
        }
    }

    fn compose(&mut self, packet: &mut Packet) -> Result<(), ComposeError> {
        match self {
            ComposerStack::Media(c) => c.compose(packet),
            ComposerStack::MediaFec(c) => c.compose(packet),
            ComposerStack::Control(c) => c.compose(packet),
        }
    }
}

// ─── Pull Status ────────────────────────────────────────────────────────────

/// First failure observed while draining the inbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PullError {
    /// An inbound packet failed to decode.
    #[error("inbound packet failed to parse: {0}")]
    Parse(#[from] ParseError),
    /// The session declined a decoded packet.
    #[error("session rejected decoded packet: {0}")]
    Route(#[source] WriteError),
}

// ─── Sender Endpoint ────────────────────────────────────────────────────────

/// Per-endpoint protocol adaptation pipeline. Owned by exactly one session.
pub struct SenderEndpoint {
    proto: Protocol,
    tracker: Arc<dyn ActivityTracker>,
    router: Box<dyn InboundRouter>,

    // Outbound sub-pipeline. Absent iff the endpoint is invalid.
    shipper: Option<Shipper<ComposerStack>>,

    // Inbound sub-pipeline. The parser exists only for protocols with
    // feedback traffic; the queue always exists so construction stays
    // uniform across protocols.
    parser: Option<ControlParser>,
    inbound_writer: InboundWriter,
    inbound_rx: Receiver<Packet>,

    stats: EndpointStats,
}

impl SenderEndpoint {
    /// Build the endpoint pipeline for `proto`.
    ///
    /// `dest` is stamped onto every outgoing packet at the end of the chain;
    /// `outbound` is the transport writer those packets are handed to.
    /// Callers must check [`is_valid`](Self::is_valid) before wiring the
    /// endpoint into a data path: an invalid endpoint has no pipeline and
    /// stays that way for its whole life.
    pub fn new(
        proto: Protocol,
        tracker: Arc<dyn ActivityTracker>,
        router: Box<dyn InboundRouter>,
        dest: SocketAddr,
        outbound: Box<dyn PacketWriter>,
    ) -> Self {
        let (inbound_writer, inbound_rx) = inbound_queue(tracker.clone(), INBOUND_QUEUE_CAPACITY);

        let caps = proto.capabilities();
        let shipper = caps.map(|caps| {
            let composer = if caps.is_control {
                ComposerStack::Control(ControlComposer::new())
            } else if caps.needs_fec {
                ComposerStack::MediaFec(FecSourceComposer::new(MediaComposer::new()))
            } else {
                ComposerStack::Media(MediaComposer::new())
            };
            Shipper::new(composer, dest, outbound)
        });
        let parser = match caps {
            Some(caps) if caps.supports_inbound => Some(ControlParser::new()),
            _ => None,
        };

        match &shipper {
            Some(_) => debug!(proto = %proto, dest = %dest, "sender endpoint constructed"),
            None => warn!(proto = %proto, "protocol not serviceable on sender data path"),
        }

        SenderEndpoint {
            proto,
            tracker,
            router,
            shipper,
            parser,
            inbound_writer,
            inbound_rx,
            stats: EndpointStats::new(),
        }
    }

    /// Whether every stage the protocol requires was wired at construction.
    pub fn is_valid(&self) -> bool {
        self.shipper.is_some()
    }

    /// Protocol this endpoint speaks.
    pub fn protocol(&self) -> Protocol {
        self.proto
    }

    /// Top-level outbound composer, for packet-size budgeting by the
    /// session. Stable for the endpoint's lifetime; `None` iff invalid.
    pub fn composer(&self) -> Option<&ComposerStack> {
        self.shipper.as_ref().map(|shipper| shipper.composer())
    }

    /// Entry point for fully formed outbound packets from the session.
    ///
    /// The endpoint is itself the first stage of the outbound chain: writing
    /// here runs the packet through compose → optional FEC framing → ship,
    /// synchronously on the pipeline thread.
    pub fn outbound_writer(&mut self) -> &mut dyn PacketWriter {
        self
    }

    /// Producer handle for raw inbound packets from the network threads, or
    /// `None` when the protocol defines no inbound traffic toward the
    /// sender.
    pub fn inbound_writer(&self) -> Option<InboundWriter> {
        self.parser.as_ref().map(|_| self.inbound_writer.clone())
    }

    /// Endpoint counters.
    pub fn stats(&self) -> &EndpointStats {
        &self.stats
    }

    /// Drain packets enqueued by the network threads into the session.
    ///
    /// Processes exactly the packets present when the call starts and never
    /// waits for more. The first failure is kept and returned once the
    /// drain finishes, so one malformed packet cannot starve the queue.
    /// Returns the number of packets drained on full success. Must be
    /// called from the pipeline thread only.
    pub fn pull_packets(&mut self, now_us: u64) -> Result<usize, PullError> {
        let Some(parser) = self.parser.as_ref() else {
            // Queues of protocols without inbound support are never drained.
            return Ok(0);
        };

        let ready = self.inbound_rx.len();
        let mut drained = 0usize;
        let mut first_err: Option<PullError> = None;

        for _ in 0..ready {
            let Ok(mut packet) = self.inbound_rx.try_recv() else {
                break;
            };
            drained += 1;

            let result = match parser.parse(&mut packet) {
                Ok(()) => self
                    .router
                    .route_inbound(packet, now_us)
                    .map_err(PullError::Route),
                Err(err) => Err(PullError::Parse(err)),
            };
            if let Err(err) = result {
                match err {
                    PullError::Parse(_) => self.stats.parse_errors += 1,
                    PullError::Route(_) => self.stats.route_errors += 1,
                }
                warn!(proto = %self.proto, error = %err, "dropped inbound packet");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }

        if drained > 0 {
            self.tracker.notify_drained(drained);
            self.stats.packets_pulled += drained as u64;
        }

        match first_err {
            None => Ok(drained),
            Some(err) => Err(err),
        }
    }
}

impl PacketWriter for SenderEndpoint {
    fn write(&mut self, packet: Packet) -> Result<(), WriteError> {
        let Some(shipper) = self.shipper.as_mut() else {
            return Err(WriteError::NotOperational);
        };
        match shipper.ship(packet) {
            Ok(wire_len) => {
                self.stats.packets_shipped += 1;
                self.stats.bytes_shipped += wire_len as u64;
                Ok(())
            }
            Err(err) => {
                match &err {
                    WriteError::Compose(e) => {
                        self.stats.compose_errors += 1;
                        warn!(proto = %self.proto, error = %e, "outbound packet rejected by encoder");
                    }
                    // The shipper already logged the transport rejection.
                    _ => self.stats.transport_errors += 1,
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_tracker::StateTracker;
    use bytes::{Bytes, BytesMut};
    use rill_packet::control::{ControlReport, ReceiverReport, SenderReport};
    use rill_packet::fec::{FecTrailer, FEC_SOURCE_OVERHEAD};
    use rill_packet::media::MEDIA_HEADER_SIZE;
    use rill_packet::packet::MediaInfo;
    use std::sync::{Arc, Mutex};

    // ─── Doubles ────────────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct CaptureWriter {
        sunk: Arc<Mutex<Vec<Packet>>>,
        reject: bool,
    }

    impl PacketWriter for CaptureWriter {
        fn write(&mut self, packet: Packet) -> Result<(), WriteError> {
            if self.reject {
                return Err(WriteError::Transport("link down".into()));
            }
            self.sunk.lock().unwrap().push(packet);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CollectRouter {
        routed: Arc<Mutex<Vec<(Packet, u64)>>>,
        reject: bool,
    }

    impl InboundRouter for CollectRouter {
        fn route_inbound(&mut self, packet: Packet, now_us: u64) -> Result<(), WriteError> {
            if self.reject {
                return Err(WriteError::Transport("session closed".into()));
            }
            self.routed.lock().unwrap().push((packet, now_us));
            Ok(())
        }
    }

    // ─── Helpers ────────────────────────────────────────────────────────

    fn dest() -> SocketAddr {
        "192.0.2.10:5004".parse().unwrap()
    }

    fn endpoint(proto: Protocol) -> (SenderEndpoint, CaptureWriter, CollectRouter, Arc<StateTracker>) {
        let tracker = Arc::new(StateTracker::new());
        let writer = CaptureWriter::default();
        let router = CollectRouter::default();
        let ep = SenderEndpoint::new(
            proto,
            tracker.clone(),
            Box::new(router.clone()),
            dest(),
            Box::new(writer.clone()),
        );
        (ep, writer, router, tracker)
    }

    fn media_packet(seq: u16) -> Packet {
        Packet::media(
            MediaInfo {
                stream: 0x5151,
                seq,
                timestamp: u32::from(seq) * 480,
                payload_type: 10,
                marker: false,
            },
            Bytes::from_static(b"0123456789"),
        )
    }

    fn report_wire() -> Bytes {
        let report = ControlReport::Receiver(ReceiverReport {
            reporter: 2,
            stream: 0x5151,
            fraction_lost: 0,
            cumulative_lost: 0,
            highest_seq: 100,
            jitter_us: 90,
        });
        let mut buf = BytesMut::new();
        report.encode(&mut buf);
        buf.freeze()
    }

    // ─── Construction & Validity ────────────────────────────────────────

    #[test]
    fn supported_protocols_construct_valid() {
        for proto in [Protocol::Media, Protocol::MediaFec, Protocol::Control] {
            let (ep, _, _, _) = endpoint(proto);
            assert!(ep.is_valid(), "{proto} endpoint should be valid");
            assert!(ep.composer().is_some());
            assert_eq!(ep.protocol(), proto);
        }
    }

    #[test]
    fn unserviceable_protocol_yields_invalid_endpoint() {
        let (mut ep, writer, _, _) = endpoint(Protocol::Signaling);
        assert!(!ep.is_valid());
        assert!(ep.composer().is_none());
        assert!(ep.inbound_writer().is_none());
        assert_eq!(
            ep.outbound_writer().write(media_packet(0)),
            Err(WriteError::NotOperational)
        );
        assert!(writer.sunk.lock().unwrap().is_empty());
    }

    #[test]
    fn inbound_writer_present_only_for_feedback_protocols() {
        for proto in [Protocol::Media, Protocol::MediaFec] {
            let (ep, _, _, _) = endpoint(proto);
            assert!(ep.inbound_writer().is_none(), "{proto} has no inbound path");
        }
        let (ep, _, _, _) = endpoint(Protocol::Control);
        assert!(ep.inbound_writer().is_some());
    }

    #[test]
    fn composer_overhead_reflects_protocol_stages() {
        let (plain, _, _, _) = endpoint(Protocol::Media);
        let (fec, _, _, _) = endpoint(Protocol::MediaFec);
        assert_eq!(plain.composer().unwrap().overhead(), MEDIA_HEADER_SIZE);
        assert_eq!(
            fec.composer().unwrap().overhead(),
            MEDIA_HEADER_SIZE + FEC_SOURCE_OVERHEAD
        );
    }

    // ─── Outbound Path ──────────────────────────────────────────────────

    #[test]
    fn media_write_ships_with_destination() {
        let (mut ep, writer, _, _) = endpoint(Protocol::Media);
        ep.outbound_writer().write(media_packet(0)).unwrap();

        let sunk = writer.sunk.lock().unwrap();
        assert_eq!(sunk.len(), 1);
        assert_eq!(sunk[0].dest, Some(dest()));
        assert_eq!(sunk[0].wire_len(), MEDIA_HEADER_SIZE + 10);
        assert!(sunk[0].fec.is_none(), "plain media must skip the FEC stage");
    }

    #[test]
    fn media_fec_write_passes_both_stages() {
        let (mut ep, writer, _, _) = endpoint(Protocol::MediaFec);
        for seq in 0..3 {
            ep.outbound_writer().write(media_packet(seq)).unwrap();
        }

        let sunk = writer.sunk.lock().unwrap();
        assert_eq!(sunk.len(), 3);
        for (i, pkt) in sunk.iter().enumerate() {
            assert_eq!(pkt.dest, Some(dest()));
            assert_eq!(
                pkt.wire_len(),
                MEDIA_HEADER_SIZE + 10 + FEC_SOURCE_OVERHEAD,
                "wire image must carry both framings"
            );
            let trailer = FecTrailer::read_from(&pkt.data).unwrap();
            assert_eq!(trailer.info.symbol, i as u16);
            assert_eq!(pkt.fec, Some(trailer.info));
        }
        assert_eq!(ep.stats().packets_shipped, 3);
    }

    #[test]
    fn control_write_composes_report() {
        let (mut ep, writer, _, _) = endpoint(Protocol::Control);
        let report = ControlReport::Sender(SenderReport {
            stream: 0x5151,
            wallclock_us: 1_000_000,
            timestamp: 48_000,
            packet_count: 10,
            byte_count: 1000,
        });
        ep.outbound_writer().write(Packet::control(report)).unwrap();

        let sunk = writer.sunk.lock().unwrap();
        assert_eq!(sunk.len(), 1);
        assert_eq!(sunk[0].wire_len(), report.wire_len());
    }

    #[test]
    fn compose_rejection_drops_packet_and_counts() {
        let (mut ep, writer, _, _) = endpoint(Protocol::Media);
        let bad = Packet::inbound(Bytes::new()); // no media metadata
        assert!(matches!(
            ep.outbound_writer().write(bad),
            Err(WriteError::Compose(_))
        ));
        assert!(writer.sunk.lock().unwrap().is_empty());
        assert_eq!(ep.stats().compose_errors, 1);
        assert_eq!(ep.stats().packets_shipped, 0);
    }

    #[test]
    fn transport_rejection_propagates_and_counts() {
        let tracker = Arc::new(StateTracker::new());
        let writer = CaptureWriter {
            reject: true,
            ..CaptureWriter::default()
        };
        let mut ep = SenderEndpoint::new(
            Protocol::Media,
            tracker,
            Box::new(CollectRouter::default()),
            dest(),
            Box::new(writer),
        );
        assert_eq!(
            ep.outbound_writer().write(media_packet(0)),
            Err(WriteError::Transport("link down".into()))
        );
        assert_eq!(ep.stats().transport_errors, 1);
    }

    // ─── Inbound Path ───────────────────────────────────────────────────

    #[test]
    fn pull_on_empty_queue_is_a_noop() {
        let (mut ep, _, router, _) = endpoint(Protocol::Control);
        assert_eq!(ep.pull_packets(1_000), Ok(0));
        assert!(router.routed.lock().unwrap().is_empty());
    }

    #[test]
    fn pull_drains_decodes_and_routes() {
        let (mut ep, _, router, tracker) = endpoint(Protocol::Control);
        let inbound = ep.inbound_writer().unwrap();

        for _ in 0..3 {
            inbound.write(Packet::inbound(report_wire())).unwrap();
        }
        assert_eq!(tracker.pending_inbound(), 3);

        assert_eq!(ep.pull_packets(42), Ok(3));

        let routed = router.routed.lock().unwrap();
        assert_eq!(routed.len(), 3);
        for (pkt, now_us) in routed.iter() {
            assert!(pkt.control.is_some(), "routed packets must be decoded");
            assert_eq!(*now_us, 42);
        }
        assert_eq!(tracker.pending_inbound(), 0);
        assert_eq!(ep.stats().packets_pulled, 3);
    }

    #[test]
    fn pull_survives_malformed_packet() {
        let (mut ep, _, router, tracker) = endpoint(Protocol::Control);
        let inbound = ep.inbound_writer().unwrap();

        inbound.write(Packet::inbound(report_wire())).unwrap();
        inbound
            .write(Packet::inbound(Bytes::from_static(b"\xFF\xFF\xFF\xFF")))
            .unwrap();
        inbound.write(Packet::inbound(report_wire())).unwrap();

        let err = ep.pull_packets(7).unwrap_err();
        assert!(matches!(err, PullError::Parse(_)));

        // Both well-formed packets still made it through.
        assert_eq!(router.routed.lock().unwrap().len(), 2);
        assert_eq!(tracker.pending_inbound(), 0);
        assert_eq!(ep.stats().parse_errors, 1);
        assert_eq!(ep.stats().packets_pulled, 3);
    }

    #[test]
    fn pull_reports_session_rejection_but_keeps_draining() {
        let tracker = Arc::new(StateTracker::new());
        let router = CollectRouter {
            reject: true,
            ..CollectRouter::default()
        };
        let mut ep = SenderEndpoint::new(
            Protocol::Control,
            tracker.clone(),
            Box::new(router),
            dest(),
            Box::new(CaptureWriter::default()),
        );
        let inbound = ep.inbound_writer().unwrap();
        inbound.write(Packet::inbound(report_wire())).unwrap();
        inbound.write(Packet::inbound(report_wire())).unwrap();

        let err = ep.pull_packets(7).unwrap_err();
        assert!(matches!(err, PullError::Route(_)));
        assert_eq!(tracker.pending_inbound(), 0, "queue must still fully drain");
        assert_eq!(ep.stats().route_errors, 2);
    }

    #[test]
    fn media_endpoint_never_drains() {
        let (mut ep, _, router, _) = endpoint(Protocol::Media);
        assert_eq!(ep.pull_packets(0), Ok(0));
        assert!(router.routed.lock().unwrap().is_empty());
    }
}
