use std::fmt::Write as _;

use pvl_types::{Digest, Position, Record, Timestamp};
use sha2::{Digest as _, Sha256};

use crate::canonical::write_string;

/// Compute a record digest.
///
/// The hash input is the canonical JSON array
/// `[position, previous_digest, canonical_payload, timestamp]`, hashed with
/// SHA-256 over its UTF-8 bytes. The payload is embedded as a JSON string so
/// field boundaries can never collide.
pub fn compute_digest(
    position: Position,
    previous_digest: &Digest,
    canonical_payload: &str,
    timestamp: &Timestamp,
) -> Digest {
    let input = digest_input(position, previous_digest, canonical_payload, timestamp);
    Digest::from_bytes(Sha256::digest(input.as_bytes()).into())
}

/// Recompute the digest a record should carry from its own stored fields.
pub fn recompute_record_digest(record: &Record) -> Digest {
    compute_digest(
        record.position,
        &record.previous_digest,
        &record.payload,
        &record.timestamp,
    )
}

/// The exact text fed to SHA-256 by [`compute_digest`].
pub fn digest_input(
    position: Position,
    previous_digest: &Digest,
    canonical_payload: &str,
    timestamp: &Timestamp,
) -> String {
    let mut out = String::with_capacity(canonical_payload.len() + 128);
    let _ = write!(out, "[{position},");
    write_string(previous_digest.as_str(), &mut out);
    out.push(',');
    write_string(canonical_payload, &mut out);
    out.push(',');
    write_string(&timestamp.to_canonical_string(), &mut out);
    out.push(']');
    out
}
