//! In-memory permit collection.

use crate::error::{ServerError, ServerResult};
use parking_lot::RwLock;
use permit_sync_protocol::Permit;
use serde_json::Value;

/// Ordered collection of permit records.
///
/// Records are kept as raw JSON so that malformed entries can be seeded,
/// the way a hand-edited JSON file backing a development server would hold
/// them. Everything written through [`Self::insert`] and [`Self::replace`]
/// is a valid permit.
#[derive(Debug, Default)]
pub struct PermitStore {
    records: RwLock<Vec<Value>>,
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn to_record(permit: &Permit) -> ServerResult<Value> {
    serde_json::to_value(permit).map_err(|e| ServerError::Internal(e.to_string()))
}

impl PermitStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<Value> {
        self.records.read().clone()
    }

    /// The record with the given id.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.records
            .read()
            .iter()
            .find(|record| record_id(record) == Some(id))
            .cloned()
    }

    /// Returns true if a record with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records
            .read()
            .iter()
            .any(|record| record_id(record) == Some(id))
    }

    /// Appends a permit. Fails if the id is taken.
    pub fn insert(&self, permit: &Permit) -> ServerResult<Value> {
        let record = to_record(permit)?;
        let mut records = self.records.write();
        if records.iter().any(|r| record_id(r) == Some(permit.id.as_str())) {
            return Err(ServerError::Duplicate(permit.id.clone()));
        }
        records.push(record.clone());
        Ok(record)
    }

    /// Replaces the permit with the same id in place.
    pub fn replace(&self, permit: &Permit) -> ServerResult<Value> {
        let record = to_record(permit)?;
        let mut records = self.records.write();
        let slot = records
            .iter_mut()
            .find(|r| record_id(r) == Some(permit.id.as_str()))
            .ok_or_else(|| ServerError::NotFound(permit.id.clone()))?;
        *slot = record.clone();
        Ok(record)
    }

    /// Removes the record with the given id. Returns false if absent.
    pub fn remove(&self, id: &str) -> bool {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|record| record_id(record) != Some(id));
        records.len() != before
    }

    /// Appends a record without validating it.
    pub fn push_raw(&self, record: Value) {
        self.records.write().push(record);
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Removes every record.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permit_sync_protocol::PermitStatus;
    use serde_json::json;

    fn permit(id: &str) -> Permit {
        Permit::with_id(id, "Name", "Applicant", "Zoning", PermitStatus::Approved)
    }

    #[test]
    fn empty_store() {
        let store = PermitStore::new();
        assert!(store.is_empty());
        assert!(store.get("1").is_none());
    }

    #[test]
    fn insert_keeps_order() {
        let store = PermitStore::new();
        store.insert(&permit("b")).unwrap();
        store.insert(&permit("a")).unwrap();

        let ids: Vec<_> = store.list().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!("b"), json!("a")]);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let store = PermitStore::new();
        store.insert(&permit("1")).unwrap();
        assert_eq!(
            store.insert(&permit("1")),
            Err(ServerError::Duplicate("1".into()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_in_place() {
        let store = PermitStore::new();
        store.insert(&permit("1")).unwrap();
        store.insert(&permit("2")).unwrap();

        let mut changed = permit("1");
        changed.permit_name = "Renamed".into();
        store.replace(&changed).unwrap();

        assert_eq!(store.list()[0]["permitName"], "Renamed");
        assert!(matches!(
            store.replace(&permit("9")),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn remove_and_raw_records() {
        let store = PermitStore::new();
        store.push_raw(json!({"invalid": "data"}));
        store.insert(&permit("1")).unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.remove("1"));
        assert!(!store.remove("1"));
        assert_eq!(store.list(), vec![json!({"invalid": "data"})]);

        store.clear();
        assert!(store.is_empty());
    }
}
