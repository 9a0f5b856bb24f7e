use std::io::Read;
use std::sync::Arc;

use pvl_crypto::ContentHasher;
use pvl_ledger::{Ledger, LedgerError, LedgerReader};
use pvl_store::RecordStore;
use pvl_types::{Digest, Position, Record, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::{Attestation, CertificateEntry, CertificateRequest, FileEntry, LedgerEntry};
use crate::error::{ProvenanceError, ProvenanceResult};

/// Append attempts used when none are configured.
pub const DEFAULT_APPEND_ATTEMPTS: usize = 3;

/// Outcome of checking uploaded content against a ledger record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
    /// The content hashes to the `filehash` recorded at `position`.
    Verified { position: Position, filehash: Digest },
    /// The record exists but names a different hash.
    Tampered { expected: String, actual: Digest },
    /// The record is missing, its payload does not decode, or it carries no
    /// `filehash`.
    BrokenReference { position: Position, reason: String },
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

/// File provenance on top of a shared ledger.
pub struct ProvenanceService<S> {
    ledger: Arc<Ledger<S>>,
    append_attempts: usize,
}

impl<S: RecordStore> ProvenanceService<S> {
    pub fn new(ledger: Arc<Ledger<S>>) -> Self {
        Self {
            ledger,
            append_attempts: DEFAULT_APPEND_ATTEMPTS,
        }
    }

    /// Total append attempts per write when the store reports a conflict.
    pub fn with_append_attempts(mut self, attempts: usize) -> Self {
        self.append_attempts = attempts.max(1);
        self
    }

    pub fn ledger(&self) -> &Arc<Ledger<S>> {
        &self.ledger
    }

    // ---- Registration ----

    /// Hash uploaded bytes and record them as owned by `owner_id`.
    pub fn register_file(
        &self,
        data: &[u8],
        owner_id: &str,
        filename: &str,
    ) -> ProvenanceResult<Attestation> {
        self.register_hash(ContentHasher::hash(data), owner_id, filename)
    }

    /// Like [`register_file`](Self::register_file), streaming the content.
    pub fn register_reader<R: Read>(
        &self,
        reader: R,
        owner_id: &str,
        filename: &str,
    ) -> ProvenanceResult<Attestation> {
        let filehash = ContentHasher::hash_reader(reader)?;
        self.register_hash(filehash, owner_id, filename)
    }

    fn register_hash(
        &self,
        filehash: Digest,
        owner_id: &str,
        filename: &str,
    ) -> ProvenanceResult<Attestation> {
        if owner_id.trim().is_empty() {
            return Err(ProvenanceError::InvalidInput("owner_id must not be empty".into()));
        }
        let entry = LedgerEntry::File(FileEntry {
            filehash,
            owner_id: owner_id.to_owned(),
            filename: filename.to_owned(),
            uploaded_at: Timestamp::now(),
        });
        self.commit(entry)
    }

    // ---- Certificates ----

    pub fn issue_certificate(&self, request: CertificateRequest) -> ProvenanceResult<Attestation> {
        if request.owner.trim().is_empty() {
            return Err(ProvenanceError::InvalidInput("owner must not be empty".into()));
        }
        let entry = LedgerEntry::Certificate(CertificateEntry {
            cert_id: Uuid::now_v7(),
            filehash: request.filehash,
            filename: request.filename,
            owner: request.owner,
            issued_at: Timestamp::now(),
        });
        self.commit(entry)
    }

    /// The attestation that issued `cert_id`, if any.
    pub fn find_certificate(&self, cert_id: Uuid) -> ProvenanceResult<Option<Attestation>> {
        for record in self
            .ledger
            .find_by_payload_field("cert_id", cert_id.to_string())?
        {
            if let Some(attestation) = Attestation::from_record(&record?) {
                if attestation.cert_id() == Some(cert_id) {
                    return Ok(Some(attestation));
                }
            }
        }
        Ok(None)
    }

    // ---- Verification ----

    /// Hash `data` and compare it with the `filehash` recorded at `position`.
    pub fn verify_file(&self, data: &[u8], position: Position) -> ProvenanceResult<Verification> {
        self.verify_hash(&ContentHasher::hash(data), position)
    }

    pub fn verify_reader<R: Read>(
        &self,
        reader: R,
        position: Position,
    ) -> ProvenanceResult<Verification> {
        let actual = ContentHasher::hash_reader(reader)?;
        self.verify_hash(&actual, position)
    }

    fn verify_hash(&self, actual: &Digest, position: Position) -> ProvenanceResult<Verification> {
        let record = match self.ledger.get_by_position(position) {
            Ok(record) => record,
            Err(LedgerError::NotFound(_)) => {
                return Ok(broken(position, "no record at this position"));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(compare(&record, actual))
    }

    // ---- Lookup ----

    /// Every record naming `filehash`, most recent first.
    pub fn attestations_for(&self, filehash: &Digest) -> ProvenanceResult<Vec<Attestation>> {
        let mut found = Vec::new();
        for record in self
            .ledger
            .find_by_payload_field("filehash", filehash.as_str())?
        {
            if let Some(attestation) = Attestation::from_record(&record?) {
                found.push(attestation);
            }
        }
        Ok(found)
    }

    fn commit(&self, entry: LedgerEntry) -> ProvenanceResult<Attestation> {
        let payload = serde_json::to_value(&entry)?;
        let record = self
            .ledger
            .append_with_retry(&payload, self.append_attempts)?;
        tracing::debug!(
            position = record.position,
            kind = entry.kind(),
            filehash = %entry.filehash().short(),
            "recorded provenance entry"
        );
        Ok(Attestation {
            block_index: record.position,
            digest: record.digest,
            timestamp: record.timestamp,
            entry,
        })
    }
}

fn compare(record: &Record, actual: &Digest) -> Verification {
    let payload = match record.decode_payload() {
        Ok(payload) => payload,
        Err(err) => return broken(record.position, &err.to_string()),
    };
    match payload.get("filehash").and_then(|v| v.as_str()) {
        Some(expected) if expected.eq_ignore_ascii_case(actual.as_str()) => {
            Verification::Verified {
                position: record.position,
                filehash: actual.clone(),
            }
        }
        Some(expected) => Verification::Tampered {
            expected: expected.to_owned(),
            actual: actual.clone(),
        },
        None => broken(record.position, "record carries no filehash"),
    }
}

fn broken(position: Position, reason: &str) -> Verification {
    Verification::BrokenReference {
        position,
        reason: reason.to_owned(),
    }
}
