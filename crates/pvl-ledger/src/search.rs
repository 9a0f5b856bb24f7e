use pvl_store::RecordStore;
use pvl_types::{Position, Record};
use serde_json::Value;

use crate::error::LedgerError;

/// Lazy, most-recent-first search over record payloads.
///
/// Created by [`Ledger::find_by_payload_field`](crate::Ledger::find_by_payload_field).
/// The upper bound is the tail observed at creation, so records appended
/// afterwards are not visited. Each call to `next` fetches at most one record
/// per position it steps over.
pub struct PayloadSearch<'a, S: ?Sized> {
    store: &'a S,
    key: String,
    value: Value,
    start: Option<Position>,
    cursor: Option<Position>,
}

impl<S: ?Sized> Clone for PayloadSearch<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            key: self.key.clone(),
            value: self.value.clone(),
            start: self.start,
            cursor: self.cursor,
        }
    }
}

impl<'a, S: RecordStore + ?Sized> PayloadSearch<'a, S> {
    pub(crate) fn new(store: &'a S, key: &str, value: Value, start: Option<Position>) -> Self {
        Self {
            store,
            key: key.to_owned(),
            value,
            start,
            cursor: start,
        }
    }

    /// Rewind to the tail captured at creation.
    pub fn restart(&mut self) {
        self.cursor = self.start;
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn matches(&self, record: &Record) -> bool {
        // Undecodable payloads never match.
        let Ok(payload) = record.decode_payload() else {
            return false;
        };
        payload_matches(&payload, &self.key, &self.value)
    }
}

impl<S: RecordStore + ?Sized> Iterator for PayloadSearch<'_, S> {
    type Item = Result<Record, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.cursor?;
            self.cursor = position.checked_sub(1);

            match self.store.get(position) {
                Err(err) => return Some(Err(err.into())),
                Ok(None) => continue,
                Ok(Some(record)) if self.matches(&record) => return Some(Ok(record)),
                Ok(Some(_)) => continue,
            }
        }
    }
}

/// Whether a decoded payload holds `value` under `key`.
///
/// An object matches when `payload[key] == value`, or when `payload[key]` is
/// an array containing `value`. A top-level array matches when it contains
/// `value`.
pub fn payload_matches(payload: &Value, key: &str, value: &Value) -> bool {
    match payload {
        Value::Object(map) => match map.get(key) {
            Some(found) if found == value => true,
            Some(Value::Array(items)) => items.contains(value),
            _ => false,
        },
        Value::Array(items) => items.contains(value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_field_equality() {
        let payload = json!({"filehash": "ab", "owner_id": "u1"});
        assert!(payload_matches(&payload, "filehash", &json!("ab")));
        assert!(!payload_matches(&payload, "filehash", &json!("cd")));
        assert!(!payload_matches(&payload, "missing", &json!("ab")));
    }

    #[test]
    fn array_under_key_contains_value() {
        let payload = json!({"filehashes": ["ab", "cd"]});
        assert!(payload_matches(&payload, "filehashes", &json!("cd")));
        assert!(!payload_matches(&payload, "filehashes", &json!("ef")));
    }

    #[test]
    fn top_level_array_contains_value() {
        let payload = json!(["ab", 3]);
        assert!(payload_matches(&payload, "ignored", &json!(3)));
        assert!(!payload_matches(&payload, "ignored", &json!("3")));
    }

    #[test]
    fn scalars_never_match() {
        assert!(!payload_matches(&json!("ab"), "filehash", &json!("ab")));
        assert!(!payload_matches(&json!(null), "filehash", &json!(null)));
    }

    #[test]
    fn types_are_not_coerced() {
        let payload = json!({"n": 1});
        assert!(payload_matches(&payload, "n", &json!(1)));
        assert!(!payload_matches(&payload, "n", &json!("1")));
    }
}
