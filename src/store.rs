//! Record-store operation contract.
//!
//! Every CRUD service in the application talks to the shared relational
//! store through this shape: validated input in, exactly one logical
//! unit of work, `ServiceResult` out. Backend failures are wrapped as
//! `DataStore` errors at the boundary — no driver error type ever
//! reaches a caller.

use std::sync::RwLock;

use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// A storable record with a stable identifier.
pub trait Entity: Clone + Send + Sync {
    fn id(&self) -> Uuid;

    /// Entity name used in audit records and `NotFound` errors.
    fn entity_type() -> &'static str;
}

/// Uniform CRUD contract implemented by the data layer.
pub trait RecordStore<T: Entity>: Send + Sync {
    fn insert(&self, record: &T) -> ServiceResult<()>;

    fn get(&self, id: Uuid) -> ServiceResult<Option<T>>;

    /// Update an existing record; `NotFound` if it does not exist.
    fn update(&self, record: &T) -> ServiceResult<()>;

    /// Delete by id; `NotFound` if it does not exist.
    fn delete(&self, id: Uuid) -> ServiceResult<()>;

    fn list(&self) -> ServiceResult<Vec<T>>;

    fn list_where(&self, filter: &dyn Fn(&T) -> bool) -> ServiceResult<Vec<T>>;
}

/// In-memory reference implementation, used by tests and as executable
/// documentation of the contract.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Entity> InMemoryRecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> RecordStore<T> for InMemoryRecordStore<T> {
    fn insert(&self, record: &T) -> ServiceResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        records.push(record.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> ServiceResult<Option<T>> {
        let records = self
            .records
            .read()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    fn update(&self, record: &T) -> ServiceResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(ServiceError::record_not_found(T::entity_type())),
        }
    }

    fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            Err(ServiceError::record_not_found(T::entity_type()))
        } else {
            Ok(())
        }
    }

    fn list(&self) -> ServiceResult<Vec<T>> {
        let records = self
            .records
            .read()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        Ok(records.clone())
    }

    fn list_where(&self, filter: &dyn Fn(&T) -> bool) -> ServiceResult<Vec<T>> {
        let records = self
            .records
            .read()
            .map_err(|_| ServiceError::from_store("record store lock poisoned"))?;
        Ok(records.iter().filter(|r| filter(r)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[derive(Debug, Clone, PartialEq)]
    struct Donation {
        id: Uuid,
        donor: String,
        amount_cents: i64,
    }

    impl Entity for Donation {
        fn id(&self) -> Uuid {
            self.id
        }

        fn entity_type() -> &'static str {
            "Donation"
        }
    }

    fn donation(donor: &str, amount_cents: i64) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            donor: donor.to_string(),
            amount_cents,
        }
    }

    #[test]
    fn test_insert_get_update_delete() {
        let store = InMemoryRecordStore::new();
        let mut record = donation("donor1", 5_000);
        store.insert(&record).unwrap();

        assert_eq!(store.get(record.id).unwrap().unwrap(), record);

        record.amount_cents = 7_500;
        store.update(&record).unwrap();
        assert_eq!(store.get(record.id).unwrap().unwrap().amount_cents, 7_500);

        store.delete(record.id).unwrap();
        assert!(store.get(record.id).unwrap().is_none());
    }

    #[test]
    fn test_missing_records_are_not_found_category() {
        let store: InMemoryRecordStore<Donation> = InMemoryRecordStore::new();
        let ghost = donation("nobody", 1);

        let err = store.update(&ghost).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        let err = store.delete(ghost.id).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        // A plain read of an absent id is Ok(None), not an error.
        assert!(store.get(ghost.id).unwrap().is_none());
    }

    #[test]
    fn test_list_where_filters() {
        let store = InMemoryRecordStore::new();
        store.insert(&donation("a", 100)).unwrap();
        store.insert(&donation("b", 2_000)).unwrap();
        store.insert(&donation("c", 3_000)).unwrap();

        let large = store.list_where(&|d: &Donation| d.amount_cents >= 2_000).unwrap();
        assert_eq!(large.len(), 2);
        assert_eq!(store.list().unwrap().len(), 3);
    }
}
