use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvenanceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read content: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger error: {0}")]
    Ledger(#[from] pvl_ledger::LedgerError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ProvenanceResult<T> = Result<T, ProvenanceError>;
