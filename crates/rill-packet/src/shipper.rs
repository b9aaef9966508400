//! # Shipper
//!
//! Terminal stage of the outbound chain: runs the packet through the
//! top-level composer, stamps the destination address, and hands the packet
//! to the transport writer. The shipper itself adds no encoding.

use std::net::SocketAddr;

use tracing::warn;

use crate::composer::Composer;
use crate::packet::Packet;
use crate::writer::{PacketWriter, WriteError};

/// Terminal outbound stage owning the composer chain, the destination
/// address, and the transport writer.
pub struct Shipper<C> {
    composer: C,
    dest: SocketAddr,
    writer: Box<dyn PacketWriter>,
}

impl<C: Composer> Shipper<C> {
    pub fn new(composer: C, dest: SocketAddr, writer: Box<dyn PacketWriter>) -> Self {
        Shipper {
            composer,
            dest,
            writer,
        }
    }

    /// The top-level composer, for size/overhead queries.
    pub fn composer(&self) -> &C {
        &self.composer
    }

    /// Destination stamped onto every shipped packet.
    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    /// Compose, stamp the destination, and forward to the transport.
    ///
    /// Returns the wire length handed over on success.
    pub fn ship(&mut self, mut packet: Packet) -> Result<usize, WriteError> {
        self.composer.compose(&mut packet)?;
        packet.dest = Some(self.dest);
        let wire_len = packet.wire_len();
        self.writer.write(packet).map_err(|err| {
            warn!(dest = %self.dest, error = %err, "transport rejected outbound packet");
            err
        })?;
        Ok(wire_len)
    }
}
