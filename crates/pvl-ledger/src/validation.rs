use pvl_crypto::{ChainError, HashChainVerifier};
use pvl_types::Position;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Result of a full chain audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub record_count: u64,
    pub genesis_valid: bool,
    pub sequence_contiguous: bool,
    pub links_valid: bool,
    pub digests_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Build a report from the problems found in a chain of `record_count`
    /// records.
    pub fn from_chain_errors(record_count: u64, errors: Vec<ChainError>) -> Self {
        let violations: Vec<Violation> = errors.into_iter().map(Violation::from).collect();
        let clean = |kind: ViolationKind| !violations.iter().any(|v| v.kind == kind);

        Self {
            record_count,
            genesis_valid: clean(ViolationKind::InvalidGenesis),
            sequence_contiguous: clean(ViolationKind::SequenceGap),
            links_valid: clean(ViolationKind::BrokenLink),
            digests_valid: clean(ViolationKind::DigestMismatch),
            violations,
        }
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub position: Position,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    InvalidGenesis,
    SequenceGap,
    BrokenLink,
    DigestMismatch,
}

impl From<ChainError> for Violation {
    fn from(err: ChainError) -> Self {
        let kind = match err {
            ChainError::InvalidGenesis { .. } => ViolationKind::InvalidGenesis,
            ChainError::SequenceGap { .. } => ViolationKind::SequenceGap,
            ChainError::BrokenLink { .. } => ViolationKind::BrokenLink,
            ChainError::DigestMismatch { .. } => ViolationKind::DigestMismatch,
        };
        Self {
            position: err.position(),
            kind,
            description: err.to_string(),
        }
    }
}

/// Chain integrity validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Scan every record in ascending order and collect all violations.
    ///
    /// Fails only when the records cannot be read.
    pub fn audit<R: LedgerReader + ?Sized>(reader: &R) -> Result<ValidationReport, LedgerError> {
        let records = reader.records()?;
        let errors = HashChainVerifier::violations(&records);
        Ok(ValidationReport::from_chain_errors(
            records.len() as u64,
            errors,
        ))
    }

    /// Whether the whole chain is intact.
    pub fn validate<R: LedgerReader + ?Sized>(reader: &R) -> Result<bool, LedgerError> {
        Ok(Self::audit(reader)?.is_valid())
    }
}
