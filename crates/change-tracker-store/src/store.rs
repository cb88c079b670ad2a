/// In-memory record store keyed by model name.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use crate::model::ModelSchema;
use crate::record::StoreRecord;

/// Holds model schemas and the live records created from them.
///
/// Single-threaded: shared between the host and its `StoreAdapter` through
/// an `Rc<MemoryStore>`.
#[derive(Default)]
pub struct MemoryStore {
    models: RefCell<HashMap<String, Rc<ModelSchema>>>,
    /// Live records in creation order.
    records: RefCell<Vec<StoreRecord>>,
    next_key: Cell<u64>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("models", &self.models.borrow().len())
            .field("records", &self.records.borrow().len())
            .field("next_key", &self.next_key.get())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Registers (or replaces) a model schema.
    pub fn define_model(&self, schema: ModelSchema) {
        tracing::debug!(model = %schema.name, "Defining model");
        self.models
            .borrow_mut()
            .insert(schema.name.clone(), Rc::new(schema));
    }

    /// Registers every schema listed in a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_models(&self, path: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {}", path.display()))?;
        let schemas: Vec<ModelSchema> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model file: {}", path.display()))?;
        let count = schemas.len();
        for schema in schemas {
            self.define_model(schema);
        }
        Ok(count)
    }

    pub fn schema(&self, model: &str) -> Option<Rc<ModelSchema>> {
        self.models.borrow().get(model).cloned()
    }

    /// Creates an empty live record of `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` was never defined.
    pub fn create_record(&self, model: &str) -> Result<StoreRecord> {
        let Some(schema) = self.schema(model) else {
            bail!("unknown model `{model}`");
        };
        let key = self.next_key.get();
        self.next_key.set(key + 1);

        let record = StoreRecord::new(key, schema);
        self.records.borrow_mut().push(record.clone());
        tracing::debug!(?record, "Created record");
        Ok(record)
    }

    /// Marks `record` deleted and drops it from the live set.
    ///
    /// # Errors
    ///
    /// Returns an error if the record was already deleted.
    pub fn delete_record(&self, record: &StoreRecord) -> Result<()> {
        if record.is_deleted() {
            bail!("record {record:?} is already deleted");
        }
        record.mark_deleted();
        self.records.borrow_mut().retain(|r| r != record);
        tracing::debug!(?record, "Deleted record");
        Ok(())
    }

    /// Looks up a live record by key.
    pub fn find(&self, key: u64) -> Option<StoreRecord> {
        self.records.borrow().iter().find(|r| r.key() == key).cloned()
    }

    /// Live records of `model`, in creation order.
    pub fn records_of(&self, model: &str) -> Vec<StoreRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.model_name() == model)
            .cloned()
            .collect()
    }

    /// Number of live records across all models.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}
