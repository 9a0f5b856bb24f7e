use pvl_types::{Position, Record, GENESIS_POSITION};

use crate::digest::recompute_record_digest;

/// Hash chain integrity verifier.
///
/// Verifies that an ascending sequence of records forms a valid chain:
/// positions are contiguous from genesis, the genesis record points at the
/// `"0"` sentinel, each record's `previous_digest` matches its predecessor's
/// `digest`, and each record's `digest` recomputes from its stored fields.
/// Stored canonical payload bytes are hashed as-is, so a payload that no
/// longer decodes never interrupts verification.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first problem.
    pub fn verify_chain(records: &[Record]) -> Result<(), ChainError> {
        match Self::violations(records).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collect every problem in the chain, in position order.
    pub fn violations(records: &[Record]) -> Vec<ChainError> {
        let mut found = Vec::new();
        let mut previous: Option<&Record> = None;

        for (index, record) in records.iter().enumerate() {
            let expected = index as Position;
            if record.position != expected {
                found.push(ChainError::SequenceGap {
                    expected,
                    found: record.position,
                });
            }

            match previous {
                None => {
                    if record.position != GENESIS_POSITION
                        || !record.previous_digest.is_genesis_sentinel()
                    {
                        found.push(ChainError::InvalidGenesis {
                            position: record.position,
                        });
                    }
                }
                Some(prev) => {
                    if record.previous_digest != prev.digest {
                        found.push(ChainError::BrokenLink {
                            position: record.position,
                        });
                    }
                }
            }

            if !Self::verify_record(record) {
                found.push(ChainError::DigestMismatch {
                    position: record.position,
                });
            }

            previous = Some(record);
        }

        found
    }

    /// Check a single record's digest against its own fields.
    pub fn verify_record(record: &Record) -> bool {
        recompute_record_digest(record) == record.digest
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first record at position {position} is not a valid genesis record")]
    InvalidGenesis { position: Position },

    #[error("sequence gap: expected position {expected}, found {found}")]
    SequenceGap { expected: Position, found: Position },

    #[error("broken link at position {position}: previous digest does not match")]
    BrokenLink { position: Position },

    #[error("digest mismatch at position {position}: computed digest differs from stored")]
    DigestMismatch { position: Position },
}

impl ChainError {
    /// Position of the record the problem was found on.
    pub fn position(&self) -> Position {
        match self {
            Self::InvalidGenesis { position }
            | Self::BrokenLink { position }
            | Self::DigestMismatch { position } => *position,
            Self::SequenceGap { found, .. } => *found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::compute_digest;
    use pvl_types::{Digest, Timestamp};

    fn build_chain(count: usize) -> Vec<Record> {
        let mut chain: Vec<Record> = Vec::new();
        let timestamp: Timestamp = "2026-10-17T08:30:00Z".parse().unwrap();

        for i in 0..count {
            let position = i as Position;
            let previous_digest = chain
                .last()
                .map(|r| r.digest.clone())
                .unwrap_or_else(Digest::genesis_sentinel);
            let payload = format!(r#"{{"n":{i}}}"#);
            let digest = compute_digest(position, &previous_digest, &payload, &timestamp);
            chain.push(Record {
                position,
                previous_digest,
                digest,
                payload,
                timestamp,
            });
        }

        chain
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(HashChainVerifier::verify_chain(&[]).is_ok());
    }

    #[test]
    fn single_record_chain() {
        assert!(HashChainVerifier::verify_chain(&build_chain(1)).is_ok());
    }

    #[test]
    fn multi_record_chain() {
        assert!(HashChainVerifier::verify_chain(&build_chain(10)).is_ok());
    }

    #[test]
    fn genesis_with_real_previous_digest_fails() {
        let mut chain = build_chain(1);
        chain[0].previous_digest = Digest::from_bytes([1; 32]);
        let errors = HashChainVerifier::violations(&chain);
        assert_eq!(errors[0], ChainError::InvalidGenesis { position: 0 });
    }

    #[test]
    fn broken_link_detected() {
        let mut chain = build_chain(3);
        chain[2].previous_digest = Digest::from_bytes([99; 32]);
        let err = HashChainVerifier::verify_chain(&chain).unwrap_err();
        assert_eq!(err, ChainError::BrokenLink { position: 2 });
    }

    #[test]
    fn sequence_gap_detected() {
        let mut chain = build_chain(4);
        chain.remove(2);
        let err = HashChainVerifier::verify_chain(&chain).unwrap_err();
        assert_eq!(
            err,
            ChainError::SequenceGap {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn tampered_payload_detected() {
        let mut chain = build_chain(3);
        chain[1].payload = r#"{"n":42}"#.into();
        let err = HashChainVerifier::verify_chain(&chain).unwrap_err();
        assert_eq!(err, ChainError::DigestMismatch { position: 1 });
    }

    #[test]
    fn tampered_genesis_detected() {
        let mut chain = build_chain(2);
        chain[0].payload = r#"{"message":"Rewritten"}"#.into();
        let err = HashChainVerifier::verify_chain(&chain).unwrap_err();
        assert_eq!(err, ChainError::DigestMismatch { position: 0 });
    }

    #[test]
    fn flipped_digest_reports_both_sides() {
        let mut chain = build_chain(3);
        let mut hex = chain[1].digest.to_string();
        let flipped = if hex.ends_with('0') { '1' } else { '0' };
        hex.pop();
        hex.push(flipped);
        chain[1].digest = Digest::from_hex(&hex).unwrap();

        let errors = HashChainVerifier::violations(&chain);
        assert_eq!(
            errors,
            vec![
                ChainError::DigestMismatch { position: 1 },
                ChainError::BrokenLink { position: 2 },
            ]
        );
    }

    #[test]
    fn undecodable_payload_still_verifies() {
        let timestamp: Timestamp = "2026-10-17T08:30:00Z".parse().unwrap();
        let payload = "{not json".to_string();
        let digest = compute_digest(0, &Digest::genesis_sentinel(), &payload, &timestamp);
        let chain = vec![Record {
            position: 0,
            previous_digest: Digest::genesis_sentinel(),
            digest,
            payload,
            timestamp,
        }];
        assert!(HashChainVerifier::verify_chain(&chain).is_ok());
    }

    #[test]
    fn error_position() {
        assert_eq!(ChainError::BrokenLink { position: 4 }.position(), 4);
        assert_eq!(
            ChainError::SequenceGap {
                expected: 2,
                found: 5
            }
            .position(),
            5
        );
    }
}
