use pvl_store::StoreError;
use pvl_types::{Digest, Position, TypeError};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no record at position {0}")]
    NotFound(Position),

    #[error("no record with digest {0}")]
    DigestNotFound(Digest),

    /// A concurrent writer claimed the position or digest first. Retry the
    /// whole append against a freshly read tail.
    #[error("store conflict: {0}")]
    StoreConflict(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("payload of record {position} could not be decoded: {reason}")]
    Decode { position: Position, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StoreConflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DigestNotFound(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            Self::StoreConflict(err.to_string())
        } else {
            Self::StoreUnavailable(err.to_string())
        }
    }
}

impl From<TypeError> for LedgerError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::PayloadDecode { position, reason } => Self::Decode { position, reason },
            other => Self::Serialization(other.to_string()),
        }
    }
}
