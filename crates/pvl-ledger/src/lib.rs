//! Ledger engine for the Provenance Ledger (PVL).
//!
//! This crate is the heart of PVL. It provides:
//! - The genesis record and hash-linked appends over any [`RecordStore`](pvl_store::RecordStore)
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - Lookup by position and by digest
//! - Lazy, restartable search over payload fields
//! - Chain validation and a full audit report (genesis, sequence, links, digests)
//!
//! Appends are serialized by an engine-level mutex and the store enforces
//! uniqueness on position and digest, so a writer that loses a race gets a
//! conflict instead of forking the chain.

pub mod error;
pub mod ledger;
pub mod search;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use search::{payload_matches, PayloadSearch};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
