//! umpwire - SysEx7/UMP wire codec and Property Exchange envelope types
//!
//! This crate defines the two wire layers shared by the Property Exchange
//! bridge and any conforming counterpart:
//!
//! - [`sysex7`] packs byte payloads into 2-word UMP SysEx7 chunks and
//!   reassembles them. Pure functions, no I/O, total over all inputs.
//! - [`envelope`] is the JSON convention carried inside those payloads:
//!   `propertyId`, optional `body`, and on responses the upstream HTTP
//!   `status`.
//!
//! Transports and HTTP dispatch live in the `pebridge` crate; this crate
//! stays dependency-light so counterpart implementations can reuse it.

pub mod envelope;
pub mod sysex7;

pub use envelope::{result_property_id, Envelope};
pub use sysex7::{decode, encode, ChunkStatus, UmpPacket};
