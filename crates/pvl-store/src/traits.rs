use std::sync::Arc;

use pvl_types::{Digest, Position, Record};

use crate::error::StoreResult;

/// Persistence boundary for ledger records.
///
/// All implementations must satisfy these invariants:
/// - Records are immutable once inserted; there is no update or delete.
/// - `position` and `digest` are each unique across the store. An insert that
///   would violate either fails with a conflict error and changes nothing.
/// - An insert must extend the tail: its position is the tail position plus
///   one (or zero on an empty store).
/// - A reader never observes a partially written record.
/// - All I/O errors are propagated, never silently ignored.
pub trait RecordStore: Send + Sync {
    /// The record with the highest position, if any.
    fn tail(&self) -> StoreResult<Option<Record>>;

    /// Point lookup by position.
    fn get(&self, position: Position) -> StoreResult<Option<Record>>;

    /// Point lookup by digest.
    fn get_by_digest(&self, digest: &Digest) -> StoreResult<Option<Record>>;

    /// Durably insert a new record.
    fn insert(&self, record: &Record) -> StoreResult<()>;

    /// Every record, ordered by ascending position.
    fn scan(&self) -> StoreResult<Vec<Record>>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<u64>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    fn tail(&self) -> StoreResult<Option<Record>> {
        (**self).tail()
    }

    fn get(&self, position: Position) -> StoreResult<Option<Record>> {
        (**self).get(position)
    }

    fn get_by_digest(&self, digest: &Digest) -> StoreResult<Option<Record>> {
        (**self).get_by_digest(digest)
    }

    fn insert(&self, record: &Record) -> StoreResult<()> {
        (**self).insert(record)
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        (**self).scan()
    }

    fn len(&self) -> StoreResult<u64> {
        (**self).len()
    }

    fn is_empty(&self) -> StoreResult<bool> {
        (**self).is_empty()
    }
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn tail(&self) -> StoreResult<Option<Record>> {
        (**self).tail()
    }

    fn get(&self, position: Position) -> StoreResult<Option<Record>> {
        (**self).get(position)
    }

    fn get_by_digest(&self, digest: &Digest) -> StoreResult<Option<Record>> {
        (**self).get_by_digest(digest)
    }

    fn insert(&self, record: &Record) -> StoreResult<()> {
        (**self).insert(record)
    }

    fn scan(&self) -> StoreResult<Vec<Record>> {
        (**self).scan()
    }

    fn len(&self) -> StoreResult<u64> {
        (**self).len()
    }

    fn is_empty(&self) -> StoreResult<bool> {
        (**self).is_empty()
    }
}
