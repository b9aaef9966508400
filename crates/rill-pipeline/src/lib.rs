//! # rill-pipeline
//!
//! Per-endpoint protocol adaptation for the Rill sender.
//!
//! Each network endpoint of a sender session gets a
//! [`endpoint::SenderEndpoint`]: a fixed chain of encoding stages ending in
//! a shipper on the outbound side, and an optional parser fed by a
//! lock-free queue on the inbound side. The endpoint bridges the network
//! threads (which only enqueue) and the pipeline thread (which owns every
//! other operation).
//!
//! ## Crate structure
//!
//! - [`proto`] — Protocol identifiers and the capability table
//! - [`endpoint`] — The endpoint facade and chain construction
//! - [`inbound`] — Lock-free inbound hand-off
//! - [`state_tracker`] — Shared pending-work aggregate for the scheduler
//! - [`stats`] — Per-endpoint statistics
//! - [`config`] — TOML endpoint-set configuration

pub mod config;
pub mod endpoint;
pub mod inbound;
pub mod proto;
pub mod state_tracker;
pub mod stats;
