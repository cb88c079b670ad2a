// Minimal record and adapter used by the unit tests.
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::record::{RecordAdapter, TrackedRecord};
use crate::value::PropertyValue;

static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

struct Inner {
    id: u64,
    values: RefCell<BTreeMap<String, PropertyValue<TestRecord>>>,
}

/// Identity-compared record backed by a shared property map.
#[derive(Clone)]
pub struct TestRecord(Rc<Inner>);

impl TestRecord {
    pub fn new(values: &[(&str, &str)]) -> Self {
        let values = values
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
            .collect();
        Self(Rc::new(Inner {
            id: NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
            values: RefCell::new(values),
        }))
    }

    pub fn set(&self, name: &str, value: &str) {
        self.set_value(name, PropertyValue::from(value));
    }

    pub fn set_value(&self, name: &str, value: PropertyValue<TestRecord>) {
        self.0.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> PropertyValue<TestRecord> {
        self.get_property(name)
    }
}

impl PartialEq for TestRecord {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TestRecord {}

impl Hash for TestRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestRecord#{}", self.0.id)
    }
}

impl TrackedRecord for TestRecord {
    fn get_property(&self, name: &str) -> PropertyValue<Self> {
        self.0
            .values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_else(PropertyValue::null)
    }

    fn set_property(&self, name: &str, value: PropertyValue<Self>) -> Result<()> {
        if name == "readonly" {
            bail!("property `readonly` cannot be written");
        }
        self.set_value(name, value);
        Ok(())
    }
}

/// Adapter that records every call it receives.
#[derive(Default)]
pub struct TestAdapter {
    pub detected: Vec<String>,
    pub detect_calls: Cell<usize>,
    pub deleted: RefCell<Vec<TestRecord>>,
    pub reincarnated: RefCell<Vec<(TestRecord, TestRecord)>>,
    pub fail_delete: Cell<bool>,
    /// Adapter calls in the order they happened.
    pub log: RefCell<Vec<&'static str>>,
}

impl TestAdapter {
    pub fn detecting(properties: &[&str]) -> Self {
        Self {
            detected: properties.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.borrow().len()
    }

    pub fn reincarnate_count(&self) -> usize {
        self.reincarnated.borrow().len()
    }
}

impl RecordAdapter for TestAdapter {
    type Record = TestRecord;

    fn detect_properties(&self, _record: &TestRecord) -> Result<Vec<String>> {
        self.detect_calls.set(self.detect_calls.get() + 1);
        Ok(self.detected.clone())
    }

    fn delete_record(&self, record: &TestRecord) -> Result<()> {
        if self.fail_delete.get() {
            bail!("delete refused");
        }
        self.log.borrow_mut().push("delete");
        self.deleted.borrow_mut().push(record.clone());
        Ok(())
    }

    fn reincarnate_record(&self, dead: &TestRecord) -> Result<TestRecord> {
        self.log.borrow_mut().push("reincarnate");
        let alive = TestRecord::new(&[]);
        self.reincarnated
            .borrow_mut()
            .push((dead.clone(), alive.clone()));
        Ok(alive)
    }
}
