//! Hashing primitives for the Provenance Ledger.
//!
//! Provides canonical (sorted-key) JSON encoding for payloads, the
//! deterministic SHA-256 record digest, hash chain verification, and a
//! streaming SHA-256 content hasher for uploaded files.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod digest;
pub mod hasher;

pub use canonical::{canonicalize, canonicalize_str};
pub use chain::{ChainError, HashChainVerifier};
pub use digest::{compute_digest, digest_input, recompute_record_digest};
pub use hasher::ContentHasher;
