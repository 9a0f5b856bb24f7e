use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use pvl_types::{Digest, Position, Record};

use crate::error::{StoreError, StoreResult};
use crate::index::RecordIndex;
use crate::traits::RecordStore;

/// In-memory record store.
///
/// Intended for tests and embedding. Records live in a position-ordered map
/// behind a `RwLock`; an insert checks uniqueness and publishes the record
/// under a single write guard, so readers see either all of it or nothing.
pub struct InMemoryRecordStore {
    inner: RwLock<RecordIndex>,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RecordIndex::default()),
        }
    }

    /// Overwrite a stored record in place, ignoring immutability.
    ///
    /// Simulates tampering so chain validation can be exercised. Only built
    /// for tests or with the `test-util` feature. Returns `false` if no
    /// record occupies `record.position`.
    #[cfg(any(test, feature = "test-util"))]
    pub fn replace_unchecked(&self, record: Record) -> StoreResult<bool> {
        Ok(self.write_guard()?.replace(record))
    }

    fn read_guard(&self) -> StoreResult<RwLockReadGuard<'_, RecordIndex>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("record store read lock poisoned".into()))
    }

    fn write_guard(&self) -> StoreResult<RwLockWriteGuard<'_, RecordIndex>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("record store write lock poisoned".into()))
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn tail(&self) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.tail().cloned())
    }

    fn get(&self, position: Position) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.get(position).cloned())
    }

    fn get_by_digest(&self, digest: &Digest) -> StoreResult<Option<Record>> {
        Ok(self.read_guard()?.get_by_digest(digest).cloned())
    }

    fn insert(&self, record: &Record) -> StoreResult<()> {
        let mut index = self.write_guard()?;
        index.check_insert(record)?;
        index.insert_checked(record.clone());
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        Ok(self.read_guard()?.records().cloned().collect())
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self.read_guard()?.len() as u64)
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.read_guard().map(|i| i.len()).unwrap_or(0);
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::chain;
    use std::sync::Arc;

    #[test]
    fn insert_and_read_back() {
        let store = InMemoryRecordStore::new();
        let records = chain(3);
        for r in &records {
            store.insert(r).unwrap();
        }

        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.get(1).unwrap().unwrap(), records[1]);
        assert_eq!(store.tail().unwrap().unwrap(), records[2]);
        assert_eq!(
            store.get_by_digest(&records[0].digest).unwrap().unwrap(),
            records[0]
        );
        assert_eq!(store.scan().unwrap(), records);
    }

    #[test]
    fn empty_store() {
        let store = InMemoryRecordStore::new();
        assert!(store.is_empty().unwrap());
        assert!(store.tail().unwrap().is_none());
        assert!(store.get(0).unwrap().is_none());
        assert!(store.scan().unwrap().is_empty());
    }

    #[test]
    fn duplicate_position_is_a_conflict() {
        let store = InMemoryRecordStore::new();
        let records = chain(2);
        store.insert(&records[0]).unwrap();

        let mut rival = records[1].clone();
        rival.position = 0;
        let err = store.insert(&rival).unwrap_err();
        assert!(matches!(err, StoreError::PositionTaken(0)));
        assert!(err.is_conflict());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn duplicate_digest_is_a_conflict() {
        let store = InMemoryRecordStore::new();
        let records = chain(2);
        store.insert(&records[0]).unwrap();

        let mut copy = records[0].clone();
        copy.position = 1;
        let err = store.insert(&copy).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDigest(_)));
        assert!(err.is_conflict());
    }

    #[test]
    fn gaps_are_rejected() {
        let store = InMemoryRecordStore::new();
        let records = chain(3);
        store.insert(&records[0]).unwrap();

        let err = store.insert(&records[2]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OutOfOrder {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn replace_unchecked_swaps_digest_index() {
        let store = InMemoryRecordStore::new();
        let records = chain(2);
        for r in &records {
            store.insert(r).unwrap();
        }

        let mut forged = records[1].clone();
        forged.digest = Digest::from_bytes([0xee; 32]);
        assert!(store.replace_unchecked(forged.clone()).unwrap());
        assert!(store.get_by_digest(&records[1].digest).unwrap().is_none());
        assert_eq!(store.get_by_digest(&forged.digest).unwrap().unwrap(), forged);

        let mut missing = forged;
        missing.position = 9;
        assert!(!store.replace_unchecked(missing).unwrap());
    }

    #[test]
    fn works_through_arc_and_box() {
        let shared: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
        let boxed: Box<dyn RecordStore> = Box::new(InMemoryRecordStore::new());
        let records = chain(1);
        shared.insert(&records[0]).unwrap();
        boxed.insert(&records[0]).unwrap();
        assert_eq!(shared.len().unwrap(), 1);
        assert_eq!(boxed.len().unwrap(), 1);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryRecordStore::new();
        store.insert(&chain(1)[0]).unwrap();
        assert!(format!("{store:?}").contains("record_count: 1"));
    }
}
