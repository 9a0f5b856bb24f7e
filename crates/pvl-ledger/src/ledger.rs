use std::sync::{Mutex, MutexGuard, PoisonError};

use pvl_crypto::{canonicalize, compute_digest, HashChainVerifier};
use pvl_store::RecordStore;
use pvl_types::{
    genesis_payload, Digest, Position, Record, RecordView, Timestamp, GENESIS_POSITION,
};
use serde_json::Value;

use crate::error::LedgerError;
use crate::search::PayloadSearch;
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{ChainValidator, ValidationReport};

/// The ledger engine.
///
/// Owns record creation and hashing over a [`RecordStore`]. Genesis creation
/// and appends run under an engine-level mutex around "read tail, compute,
/// insert"; the store's uniqueness constraints catch any writer outside that
/// mutex, which then sees [`LedgerError::StoreConflict`]. Reads go straight to
/// the store and run concurrently.
///
/// Share one engine across tasks with `Arc<Ledger<S>>`.
pub struct Ledger<S> {
    store: S,
    append_lock: Mutex<()>,
}

impl<S: RecordStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append, re-reading the tail and retrying up to `attempts` times in
    /// total while the store reports a conflict. Other errors return at once.
    pub fn append_with_retry(
        &self,
        payload: &Value,
        attempts: usize,
    ) -> Result<Record, LedgerError> {
        let attempts = attempts.max(1);
        let mut last_conflict = None;
        for attempt in 1..=attempts {
            match self.append(payload) {
                Err(err) if err.is_conflict() => {
                    tracing::debug!(attempt, error = %err, "append conflict, retrying");
                    last_conflict = Some(err);
                }
                other => return other,
            }
        }
        Err(last_conflict
            .unwrap_or_else(|| LedgerError::StoreConflict("append retries exhausted".into())))
    }

    /// Lazy most-recent-first search for records whose payload holds `value`
    /// under `key`. See [`PayloadSearch`] for the matching rules.
    pub fn find_by_payload_field(
        &self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<PayloadSearch<'_, S>, LedgerError> {
        let start = self.store.tail()?.map(|tail| tail.position);
        Ok(PayloadSearch::new(&self.store, key, value.into(), start))
    }

    /// Whether the whole chain is intact. An empty chain is valid.
    ///
    /// Returns an error only when the store cannot be read.
    pub fn validate_chain(&self) -> Result<bool, LedgerError> {
        ChainValidator::validate(self)
    }

    /// Scan the whole chain and collect every violation.
    pub fn audit(&self) -> Result<ValidationReport, LedgerError> {
        ChainValidator::audit(self)
    }

    /// Recompute one record's digest and compare it with the stored value.
    pub fn verify_record(&self, position: Position) -> Result<bool, LedgerError> {
        let record = self.get_by_position(position)?;
        Ok(HashChainVerifier::verify_record(&record))
    }

    /// Every record in ascending order, as its external view.
    pub fn chain(&self) -> Result<Vec<RecordView>, LedgerError> {
        Ok(self.records()?.iter().map(Record::to_view).collect())
    }

    pub fn len(&self) -> Result<u64, LedgerError> {
        self.record_count()
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.store.is_empty()?)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data; the store stays authoritative after a
        // panicked append.
        self.append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_genesis_locked(&self) -> Result<Record, LedgerError> {
        if let Some(genesis) = self.store.get(GENESIS_POSITION)? {
            return Ok(genesis);
        }
        // A later record without a genesis means the log lost it; writing a
        // fresh one can never succeed.
        if !self.store.is_empty()? {
            return Err(LedgerError::StoreUnavailable(
                "genesis record missing from a non-empty store".into(),
            ));
        }

        let record = seal(
            GENESIS_POSITION,
            Digest::genesis_sentinel(),
            canonicalize(&genesis_payload()),
            Timestamp::now(),
        );
        self.store.insert(&record)?;
        tracing::debug!(digest = %record.digest.short(), "created genesis record");
        Ok(record)
    }
}

impl<S: RecordStore> LedgerWriter for Ledger<S> {
    fn ensure_genesis(&self) -> Result<Record, LedgerError> {
        let _guard = self.lock();
        self.ensure_genesis_locked()
    }

    fn append(&self, payload: &Value) -> Result<Record, LedgerError> {
        let canonical = canonicalize(payload);
        let _guard = self.lock();

        let tail = match self.store.tail()? {
            Some(tail) => tail,
            None => self.ensure_genesis_locked()?,
        };
        let position = tail.position.checked_add(1).ok_or_else(|| {
            LedgerError::StoreUnavailable(format!(
                "position space exhausted after {}",
                tail.position
            ))
        })?;

        let record = seal(position, tail.digest, canonical, Timestamp::now());
        self.store.insert(&record)?;
        tracing::debug!(position, digest = %record.digest.short(), "appended record");
        Ok(record)
    }
}

impl<S: RecordStore> LedgerReader for Ledger<S> {
    fn head(&self) -> Result<Option<Record>, LedgerError> {
        Ok(self.store.tail()?)
    }

    fn get_by_position(&self, position: Position) -> Result<Record, LedgerError> {
        self.store
            .get(position)?
            .ok_or(LedgerError::NotFound(position))
    }

    fn get_by_digest(&self, digest: &Digest) -> Result<Record, LedgerError> {
        self.store
            .get_by_digest(digest)?
            .ok_or_else(|| LedgerError::DigestNotFound(digest.clone()))
    }

    fn records(&self) -> Result<Vec<Record>, LedgerError> {
        Ok(self.store.scan()?)
    }

    fn record_count(&self) -> Result<u64, LedgerError> {
        Ok(self.store.len()?)
    }
}

impl<S: RecordStore + std::fmt::Debug> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("store", &self.store).finish()
    }
}

fn seal(
    position: Position,
    previous_digest: Digest,
    payload: String,
    timestamp: Timestamp,
) -> Record {
    let digest = compute_digest(position, &previous_digest, &payload, &timestamp);
    Record {
        position,
        previous_digest,
        digest,
        payload,
        timestamp,
    }
}
