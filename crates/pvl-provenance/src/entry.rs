use pvl_types::{Digest, Position, Record, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload written to the ledger by the provenance service, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEntry {
    File(FileEntry),
    Certificate(CertificateEntry),
}

impl LedgerEntry {
    pub fn filehash(&self) -> &Digest {
        match self {
            Self::File(f) => &f.filehash,
            Self::Certificate(c) => &c.filehash,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Certificate(_) => "certificate",
        }
    }
}

/// A registered upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filehash: Digest,
    pub owner_id: String,
    pub filename: String,
    pub uploaded_at: Timestamp,
}

/// An issued certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub cert_id: Uuid,
    pub filehash: Digest,
    pub filename: String,
    pub owner: String,
    pub issued_at: Timestamp,
}

/// Request to issue a certificate for a file hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub filehash: Digest,
    pub filename: String,
    pub owner: String,
}

impl CertificateRequest {
    pub fn new(filehash: Digest, owner: impl Into<String>) -> Self {
        Self {
            filehash,
            filename: String::new(),
            owner: owner.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// Proof that an entry was committed: where it sits in the chain and what it
/// says.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub block_index: Position,
    pub digest: Digest,
    pub timestamp: Timestamp,
    pub entry: LedgerEntry,
}

impl Attestation {
    /// Build from a record whose payload is a provenance entry.
    ///
    /// Returns `None` for genesis and for any foreign payload.
    pub fn from_record(record: &Record) -> Option<Self> {
        let entry = serde_json::from_str(&record.payload).ok()?;
        Some(Self {
            block_index: record.position,
            digest: record.digest.clone(),
            timestamp: record.timestamp,
            entry,
        })
    }

    pub fn cert_id(&self) -> Option<Uuid> {
        match &self.entry {
            LedgerEntry::Certificate(c) => Some(c.cert_id),
            LedgerEntry::File(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash() -> Digest {
        Digest::from_bytes([0xab; 32])
    }

    #[test]
    fn file_entry_is_tagged() {
        let entry = LedgerEntry::File(FileEntry {
            filehash: hash(),
            owner_id: "u1".into(),
            filename: "a.pdf".into(),
            uploaded_at: "2026-10-17T08:30:00Z".parse().unwrap(),
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["filehash"], json!(hash().as_str()));
        assert_eq!(value["uploaded_at"], "2026-10-17T08:30:00.000000Z");
        assert_eq!(entry.kind(), "file");
    }

    #[test]
    fn certificate_entry_parses() {
        let value = json!({
            "type": "certificate",
            "cert_id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "filehash": hash().as_str(),
            "filename": "a.pdf",
            "owner": "u1",
            "issued_at": "2026-10-17T08:30:00.000000Z",
        });
        let entry: LedgerEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.kind(), "certificate");
        assert_eq!(entry.filehash(), &hash());
    }

    #[test]
    fn foreign_payloads_are_not_attestations() {
        let record = Record {
            position: 0,
            previous_digest: Digest::genesis_sentinel(),
            digest: hash(),
            payload: r#"{"message":"Genesis Block"}"#.into(),
            timestamp: "2026-10-17T08:30:00Z".parse().unwrap(),
        };
        assert!(Attestation::from_record(&record).is_none());
    }

    #[test]
    fn request_builder() {
        let req = CertificateRequest::new(hash(), "u1").with_filename("a.pdf");
        assert_eq!(req.owner, "u1");
        assert_eq!(req.filename, "a.pdf");
    }
}
