//! Foundation types for the Provenance Ledger (PVL).
//!
//! This crate provides the value types shared by every other PVL crate.
//!
//! # Key Types
//!
//! - [`Record`]: One immutable, hash-linked ledger entry
//! - [`Digest`]: Hex SHA-256 digest (or the genesis sentinel `"0"`)
//! - [`Timestamp`]: Microsecond UTC creation time with a canonical text form
//! - [`Position`]: Zero-based chain index

pub mod digest;
pub mod error;
pub mod record;
pub mod timestamp;

pub use digest::{Digest, GENESIS_PREVIOUS_DIGEST};
pub use error::TypeError;
pub use record::{genesis_payload, Position, Record, RecordView, GENESIS_POSITION};
pub use timestamp::Timestamp;
