use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The `previous_digest` carried by the genesis record.
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";

/// Hex-encoded SHA-256 digest binding a record to its content and position.
///
/// A `Digest` is always either 64 lowercase hex characters or the genesis
/// sentinel `"0"`, which only ever appears as the genesis record's
/// `previous_digest`. Parsing normalizes upper-case hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Length of a hex-encoded SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// The sentinel that stands in for the predecessor of the genesis record.
    pub fn genesis_sentinel() -> Self {
        Self(GENESIS_PREVIOUS_DIGEST.to_string())
    }

    /// Wrap a raw 32-byte hash.
    pub fn from_bytes(hash: [u8; 32]) -> Self {
        Self(hex::encode(hash))
    }

    /// Parse a 64-character hex digest. The sentinel is not accepted here.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_bytes(arr))
    }

    /// Returns `true` for the genesis sentinel `"0"`.
    pub fn is_genesis_sentinel(&self) -> bool {
        self.0 == GENESIS_PREVIOUS_DIGEST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log lines and terse listings.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GENESIS_PREVIOUS_DIGEST {
            Ok(Self::genesis_sentinel())
        } else {
            Self::from_hex(s)
        }
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
