use std::collections::{BTreeMap, HashMap};

use pvl_types::{Digest, Position, Record};

use crate::error::{StoreError, StoreResult};

/// Position- and digest-keyed view of the stored records.
///
/// Both backends keep one of these behind a lock; the file backend rebuilds
/// it from the log on open.
#[derive(Default, Debug)]
pub(crate) struct RecordIndex {
    by_position: BTreeMap<Position, Record>,
    by_digest: HashMap<Digest, Position>,
}

impl RecordIndex {
    /// Position the next insert must carry.
    pub(crate) fn next_position(&self) -> Position {
        self.by_position
            .keys()
            .next_back()
            .map(|p| p + 1)
            .unwrap_or(0)
    }

    /// Uniqueness and ordering checks, without mutating.
    pub(crate) fn check_insert(&self, record: &Record) -> StoreResult<()> {
        if self.by_position.contains_key(&record.position) {
            return Err(StoreError::PositionTaken(record.position));
        }
        if self.by_digest.contains_key(&record.digest) {
            return Err(StoreError::DuplicateDigest(record.digest.clone()));
        }
        let expected = self.next_position();
        if record.position != expected {
            return Err(StoreError::OutOfOrder {
                expected,
                found: record.position,
            });
        }
        Ok(())
    }

    /// Insert after a successful [`check_insert`](Self::check_insert).
    pub(crate) fn insert_checked(&mut self, record: Record) {
        self.by_digest.insert(record.digest.clone(), record.position);
        self.by_position.insert(record.position, record);
    }

    /// Insert while rebuilding from a log. Positions may skip when a damaged
    /// entry was dropped, so only uniqueness is enforced.
    pub(crate) fn insert_recovered(&mut self, record: Record) -> StoreResult<()> {
        if self.by_position.contains_key(&record.position) {
            return Err(StoreError::PositionTaken(record.position));
        }
        if self.by_digest.contains_key(&record.digest) {
            return Err(StoreError::DuplicateDigest(record.digest.clone()));
        }
        self.insert_checked(record);
        Ok(())
    }

    /// Overwrite the record at an existing position, bypassing immutability.
    #[cfg(any(test, feature = "test-util"))]
    pub(crate) fn replace(&mut self, record: Record) -> bool {
        let Some(old) = self.by_position.get(&record.position) else {
            return false;
        };
        self.by_digest.remove(&old.digest);
        self.by_digest.insert(record.digest.clone(), record.position);
        self.by_position.insert(record.position, record);
        true
    }

    pub(crate) fn tail(&self) -> Option<&Record> {
        self.by_position.values().next_back()
    }

    pub(crate) fn get(&self, position: Position) -> Option<&Record> {
        self.by_position.get(&position)
    }

    pub(crate) fn get_by_digest(&self, digest: &Digest) -> Option<&Record> {
        self.by_digest
            .get(digest)
            .and_then(|position| self.by_position.get(position))
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &Record> {
        self.by_position.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_position.len()
    }
}
