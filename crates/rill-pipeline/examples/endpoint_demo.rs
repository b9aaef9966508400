//! Walk a media+FEC endpoint and a control endpoint through one send/pull
//! cycle, printing every packet that reaches the "transport".
//!
//! Run with `cargo run --example endpoint_demo -p rill-pipeline`.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use rill_packet::composer::Composer;
use rill_packet::control::{ControlReport, ReceiverReport};
use rill_packet::packet::{MediaInfo, Packet};
use rill_packet::writer::{PacketWriter, WriteError};
use rill_pipeline::endpoint::{InboundRouter, SenderEndpoint};
use rill_pipeline::proto::Protocol;
use rill_pipeline::state_tracker::StateTracker;

struct PrintWriter;

impl PacketWriter for PrintWriter {
    fn write(&mut self, packet: Packet) -> Result<(), WriteError> {
        println!(
            "transport <- {} wire bytes to {:?} (fec: {:?})",
            packet.wire_len(),
            packet.dest,
            packet.fec
        );
        Ok(())
    }
}

struct PrintRouter;

impl InboundRouter for PrintRouter {
    fn route_inbound(&mut self, packet: Packet, now_us: u64) -> Result<(), WriteError> {
        println!("session <- {:?} at t={now_us}us", packet.control);
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let tracker = Arc::new(StateTracker::new());

    // Media endpoint with FEC framing.
    let mut media = SenderEndpoint::new(
        Protocol::MediaFec,
        tracker.clone(),
        Box::new(PrintRouter),
        "127.0.0.1:5004".parse().unwrap(),
        Box::new(PrintWriter),
    );
    assert!(media.is_valid());
    println!(
        "media endpoint overhead: {} bytes/packet",
        media.composer().unwrap().overhead()
    );

    for seq in 0..3u16 {
        let pkt = Packet::media(
            MediaInfo {
                stream: 0x1234,
                seq,
                timestamp: u32::from(seq) * 480,
                payload_type: 10,
                marker: false,
            },
            Bytes::from_static(b"pcm samples here"),
        );
        media.outbound_writer().write(pkt).unwrap();
    }

    // Control endpoint: feedback comes back from the network thread.
    let mut control = SenderEndpoint::new(
        Protocol::Control,
        tracker.clone(),
        Box::new(PrintRouter),
        "127.0.0.1:5005".parse().unwrap(),
        Box::new(PrintWriter),
    );
    let inbound = control.inbound_writer().expect("control carries feedback");

    let report = ControlReport::Receiver(ReceiverReport {
        reporter: 2,
        stream: 0x1234,
        fraction_lost: 5,
        cumulative_lost: 17,
        highest_seq: 1440,
        jitter_us: 210,
    });
    let mut wire = BytesMut::new();
    report.encode(&mut wire);
    inbound.write(Packet::inbound(wire.freeze())).unwrap();

    println!("pending before pull: {}", tracker.pending_inbound());
    control.pull_packets(1_000_000).unwrap();
    println!("pending after pull:  {}", tracker.pending_inbound());
}
