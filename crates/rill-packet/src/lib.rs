//! # rill-packet
//!
//! Protocol-neutral packet model and pipeline stages for the Rill sender.
//!
//! A packet starts life as metadata plus a payload, flows through an ordered
//! chain of composer stages that produce its wire image, and leaves through a
//! terminal [`shipper::Shipper`] that stamps the destination address and hands
//! the packet to the transport writer. Inbound feedback travels the opposite
//! way: raw datagram bytes in, a decoded report out.
//!
//! ## Crate structure
//!
//! - [`packet`] — Protocol-neutral packet and per-protocol metadata
//! - [`composer`] — Encoding stage trait
//! - [`parser`] — Decoding stage trait
//! - [`writer`] — Packet sink trait shared by pipeline stages and transports
//! - [`media`] — Media transport wire header
//! - [`fec`] — FEC source framing
//! - [`control`] — Feedback report wire format
//! - [`shipper`] — Terminal outbound stage

pub mod composer;
pub mod control;
pub mod fec;
pub mod media;
pub mod packet;
pub mod parser;
pub mod shipper;
pub mod writer;
