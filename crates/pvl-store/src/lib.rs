//! Record persistence for the Provenance Ledger.
//!
//! A store holds ledger records keyed by position, with uniqueness enforced
//! on both `position` and `digest`. The store never computes or checks
//! digests; chain semantics belong to the ledger engine.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- map-based store for tests and embedding
//! - [`FileRecordStore`] -- append-only, CRC-framed log file replayed on open
//!
//! # Design Rules
//!
//! 1. Records are immutable once written.
//! 2. A conflicting insert (taken position, duplicate digest, or a position
//!    that does not extend the tail) changes nothing and returns an error.
//! 3. Concurrent reads are always safe and never see a half-written record.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
mod index;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{FileRecordStore, FileStoreConfig, RecoveryStats, SyncMode};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
