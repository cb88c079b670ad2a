/// Records held by the in-memory store.
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use anyhow::{bail, Result};
use change_tracker::{PropertyValue, TrackedRecord};

use crate::model::ModelSchema;

struct RecordData {
    key: u64,
    schema: Rc<ModelSchema>,
    values: RefCell<BTreeMap<String, PropertyValue<StoreRecord>>>,
    deleted: Cell<bool>,
}

/// Shared handle to a record in a `MemoryStore`.
///
/// Handles compare by identity. A reincarnated record is a different
/// record with a new key, even though it has the same model.
#[derive(Clone)]
pub struct StoreRecord(Rc<RecordData>);

impl StoreRecord {
    pub(crate) fn new(key: u64, schema: Rc<ModelSchema>) -> Self {
        Self(Rc::new(RecordData {
            key,
            schema,
            values: RefCell::new(BTreeMap::new()),
            deleted: Cell::new(false),
        }))
    }

    /// Store-assigned key, unique per store.
    pub fn key(&self) -> u64 {
        self.0.key
    }

    pub fn model_name(&self) -> &str {
        &self.0.schema.name
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.0.schema
    }

    pub fn is_deleted(&self) -> bool {
        self.0.deleted.get()
    }

    pub(crate) fn mark_deleted(&self) {
        self.0.deleted.set(true);
    }

    /// Shorthand for `set_property` accepting anything convertible to a value.
    pub fn set(&self, name: &str, value: impl Into<PropertyValue<StoreRecord>>) -> Result<()> {
        self.set_property(name, value.into())
    }

    pub fn get(&self, name: &str) -> PropertyValue<StoreRecord> {
        self.get_property(name)
    }
}

impl PartialEq for StoreRecord {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for StoreRecord {}

impl Hash for StoreRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl fmt::Debug for StoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model_name(), self.key())?;
        if self.is_deleted() {
            f.write_str(" (deleted)")?;
        }
        Ok(())
    }
}

impl From<StoreRecord> for PropertyValue<StoreRecord> {
    fn from(record: StoreRecord) -> Self {
        PropertyValue::Record(record)
    }
}

impl TrackedRecord for StoreRecord {
    fn get_property(&self, name: &str) -> PropertyValue<Self> {
        self.0
            .values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(PropertyValue::null)
    }

    fn set_property(&self, name: &str, value: PropertyValue<Self>) -> Result<()> {
        if self.is_deleted() {
            bail!("cannot set `{name}` on deleted record {self:?}");
        }
        if !self.0.schema.has_property(name) {
            bail!("model `{}` has no property `{name}`", self.model_name());
        }
        self.0.values.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: u64) -> StoreRecord {
        let schema = ModelSchema::new("person").attribute("firstName");
        StoreRecord::new(key, Rc::new(schema))
    }

    #[test]
    fn test_identity_equality() {
        let a = record(1);
        assert_eq!(a, a.clone());
        assert_ne!(a, record(1));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let a = record(1);
        assert!(a.set("lastName", "Smith").is_err());
        assert!(a.get("lastName").is_null());
    }

    #[test]
    fn test_deleted_record_rejects_writes() {
        let a = record(1);
        a.set("firstName", "Ann").expect("set");
        a.mark_deleted();

        assert!(a.set("firstName", "Mary").is_err());
        assert_eq!(a.get("firstName"), PropertyValue::from("Ann"));
        assert_eq!(format!("{a:?}"), "person:1 (deleted)");
    }
}
