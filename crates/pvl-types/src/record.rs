use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::Digest;
use crate::error::TypeError;
use crate::timestamp::Timestamp;

/// Zero-based index of a record in the chain.
pub type Position = u64;

/// Position of the genesis record.
pub const GENESIS_POSITION: Position = 0;

/// The well-known payload marker stored in the genesis record.
pub fn genesis_payload() -> Value {
    serde_json::json!({ "message": "Genesis Block" })
}

/// One immutable entry of the ledger.
///
/// `payload` holds the canonical serialized form of the caller's JSON value,
/// exactly the bytes that were hashed. Decoding it back is a soft operation:
/// a record whose payload no longer parses is still a structurally valid
/// chain member.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub position: Position,
    pub previous_digest: Digest,
    pub digest: Digest,
    pub payload: String,
    pub timestamp: Timestamp,
}

impl Record {
    pub fn is_genesis(&self) -> bool {
        self.position == GENESIS_POSITION
    }

    /// Parse the stored payload back into structured form.
    pub fn decode_payload(&self) -> Result<Value, TypeError> {
        serde_json::from_str(&self.payload).map_err(|e| TypeError::PayloadDecode {
            position: self.position,
            reason: e.to_string(),
        })
    }

    /// Presentation form used by chain dumps and HTTP responses.
    pub fn to_view(&self) -> RecordView {
        RecordView {
            position: self.position,
            previous_digest: self.previous_digest.clone(),
            digest: self.digest.clone(),
            payload: self
                .decode_payload()
                .unwrap_or_else(|_| Value::String(self.payload.clone())),
            timestamp: self.timestamp,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}]", self.position, self.digest.short())
    }
}

/// A record as shown to callers: the payload is decoded JSON when it parses,
/// otherwise the raw stored string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub position: Position,
    pub previous_digest: Digest,
    pub digest: Digest,
    pub payload: Value,
    pub timestamp: Timestamp,
}

impl From<&Record> for RecordView {
    fn from(record: &Record) -> Self {
        record.to_view()
    }
}
