use pvl_types::{Digest, Position, Record};
use serde_json::Value;

use crate::error::LedgerError;

/// Write boundary for ledger append operations.
pub trait LedgerWriter: Send + Sync {
    /// Create the genesis record if the ledger is empty; return it either way.
    fn ensure_genesis(&self) -> Result<Record, LedgerError>;

    /// Append one payload after the current tail.
    fn append(&self, payload: &Value) -> Result<Record, LedgerError>;
}

/// Read boundary for ledger query operations.
pub trait LedgerReader: Send + Sync {
    /// The record with the highest position, if any.
    fn head(&self) -> Result<Option<Record>, LedgerError>;

    fn get_by_position(&self, position: Position) -> Result<Record, LedgerError>;

    fn get_by_digest(&self, digest: &Digest) -> Result<Record, LedgerError>;

    /// Every record in ascending position order.
    fn records(&self) -> Result<Vec<Record>, LedgerError>;

    fn record_count(&self) -> Result<u64, LedgerError>;
}
