/// `RecordAdapter` implementation backed by a `MemoryStore`.
use std::rc::Rc;

use anyhow::{Context, Result};
use change_tracker::RecordAdapter;

use crate::record::StoreRecord;
use crate::store::MemoryStore;

/// Lets a `ChangeTracker` delete and recreate records in a `MemoryStore`.
#[derive(Debug, Clone)]
pub struct StoreAdapter {
    store: Rc<MemoryStore>,
}

impl StoreAdapter {
    pub fn new(store: Rc<MemoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Rc<MemoryStore> {
        &self.store
    }
}

impl RecordAdapter for StoreAdapter {
    type Record = StoreRecord;

    /// Attributes plus belongs-to relationships of the record's model.
    fn detect_properties(&self, record: &StoreRecord) -> Result<Vec<String>> {
        Ok(record.schema().tracked_properties())
    }

    fn delete_record(&self, record: &StoreRecord) -> Result<()> {
        self.store.delete_record(record)
    }

    /// Creates a blank record of the same model; the tracker restores its
    /// values afterwards.
    fn reincarnate_record(&self, dead: &StoreRecord) -> Result<StoreRecord> {
        self.store
            .create_record(dead.model_name())
            .with_context(|| format!("Failed to reincarnate {dead:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelSchema;

    fn adapter() -> StoreAdapter {
        let store = MemoryStore::new();
        store.define_model(
            ModelSchema::new("person")
                .attribute("firstName")
                .belongs_to("company")
                .has_many("friends"),
        );
        StoreAdapter::new(store)
    }

    #[test]
    fn test_detect_properties_excludes_collections() {
        let adapter = adapter();
        let record = adapter.store().create_record("person").expect("create");
        let properties = adapter.detect_properties(&record).expect("detect");
        assert_eq!(properties, vec!["firstName", "company"]);
    }

    #[test]
    fn test_reincarnate_creates_same_model() {
        let adapter = adapter();
        let dead = adapter.store().create_record("person").expect("create");
        adapter.delete_record(&dead).expect("delete");

        let alive = adapter.reincarnate_record(&dead).expect("reincarnate");

        assert_ne!(alive, dead);
        assert_eq!(alive.model_name(), "person");
        assert!(!alive.is_deleted());
        assert_eq!(adapter.store().records_of("person"), vec![alive]);
    }
}
