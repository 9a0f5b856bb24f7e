//! File provenance for the Provenance Ledger (PVL).
//!
//! Wraps a shared [`Ledger`](pvl_ledger::Ledger) with the operations an
//! application needs: register an upload by its SHA-256, issue certificates,
//! verify content against a recorded position, and list every attestation
//! for a file hash.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pvl_ledger::Ledger;
//! use pvl_provenance::ProvenanceService;
//! use pvl_store::InMemoryRecordStore;
//!
//! let ledger = Arc::new(Ledger::new(InMemoryRecordStore::new()));
//! let service = ProvenanceService::new(ledger);
//! let attestation = service.register_file(b"hello", "user-1", "hello.txt").unwrap();
//! assert!(service.verify_file(b"hello", attestation.block_index).unwrap().is_verified());
//! ```

pub mod entry;
pub mod error;
pub mod service;

pub use entry::{Attestation, CertificateEntry, CertificateRequest, FileEntry, LedgerEntry};
pub use error::{ProvenanceError, ProvenanceResult};
pub use service::{ProvenanceService, Verification, DEFAULT_APPEND_ATTEMPTS};
