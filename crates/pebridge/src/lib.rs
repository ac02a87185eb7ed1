//! pebridge - MIDI 2.0 Property Exchange to HTTP bridge
//!
//! Receives SysEx7-over-UMP word batches from a transport, reassembles the
//! JSON Property Exchange envelope, forwards the operation to the mapped
//! HTTP backend, and chunks the result back onto the wire.
//!
//! Module layout mirrors the flow:
//! - [`config`] - environment-driven settings
//! - [`mapping`] - property id to HTTP route resolution
//! - [`dispatch`] - the per-message state machine
//! - [`transport`] - the word-batch seam to the outside world
//!
//! The wire layers themselves (chunk codec, envelope types) live in the
//! `umpwire` crate.

pub mod config;
pub mod dispatch;
pub mod mapping;
pub mod transport;

pub use config::BridgeConfig;
pub use dispatch::Bridge;
pub use mapping::RouteTable;
