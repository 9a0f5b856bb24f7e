use pvl_types::{Digest, Position};

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record already occupies this position.
    #[error("position {0} is already occupied")]
    PositionTaken(Position),

    /// A record with this digest is already stored.
    #[error("digest {0} is already recorded")]
    DuplicateDigest(Digest),

    /// The record does not extend the current tail.
    #[error("out-of-order insert: expected position {expected}, got {found}")]
    OutOfOrder { expected: Position, found: Position },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record log is damaged in a way replay cannot skip past.
    #[error("record log corrupt at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// The backend cannot serve requests (e.g. a poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` for uniqueness and ordering collisions, which a writer
    /// resolves by re-reading the tail and trying again.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PositionTaken(_) | Self::DuplicateDigest(_) | Self::OutOfOrder { .. }
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
