/// Pending snapshots and committed batches.
///
/// The `SnapshotStore` holds the "before" values of every record touched
/// since its last commit or rollback. `CommitBatch` is what a commit turns
/// those snapshots into.
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::TrackedRecord;
use crate::value::PropertyValue;

/// Captured property values, keyed by property name.
///
/// Iteration, and therefore the order in which a restore writes values back,
/// is alphabetical by property name rather than capture order.
pub type PropertySnapshot<R> = BTreeMap<String, PropertyValue<R>>;

/// What happened to a record since its last commit or rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Change,
    Create,
    Delete,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Change => "change",
            Self::Create => "create",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Pending state for one record.
#[derive(Debug, Clone)]
struct PendingEntry<R> {
    action: PendingAction,
    properties: PropertySnapshot<R>,
}

/// Reads the current values of `names` from `record`.
pub(crate) fn read_properties<'a, R, I>(record: &R, names: I) -> PropertySnapshot<R>
where
    R: TrackedRecord,
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|name| (name.clone(), record.get_property(name)))
        .collect()
}

/// Identity-keyed map from record to its pending snapshot and action.
#[derive(Debug, Clone)]
pub struct SnapshotStore<R: TrackedRecord> {
    entries: HashMap<R, PendingEntry<R>>,
}

impl<R: TrackedRecord> Default for SnapshotStore<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<R: TrackedRecord> SnapshotStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current values of `properties` from `record`.
    ///
    /// Merges into an existing snapshot: a property that already has a
    /// captured value keeps it, so the snapshot always holds the earliest
    /// value seen since the last commit. A record with no pending action
    /// is classified as `Change`.
    pub fn capture(&mut self, record: &R, properties: &[String]) {
        let entry = self
            .entries
            .entry(record.clone())
            .or_insert_with(|| PendingEntry {
                action: PendingAction::Change,
                properties: PropertySnapshot::new(),
            });
        for name in properties {
            if !entry.properties.contains_key(name) {
                entry
                    .properties
                    .insert(name.clone(), record.get_property(name));
            }
        }
    }

    /// Overrides the pending action of an already captured record.
    ///
    /// Does nothing if the record has no pending snapshot.
    pub fn mark(&mut self, record: &R, action: PendingAction) {
        if let Some(entry) = self.entries.get_mut(record) {
            entry.action = action;
        }
    }

    /// Removes and returns the pending state of `record`.
    pub fn take(&mut self, record: &R) -> Option<(PendingAction, PropertySnapshot<R>)> {
        self.entries
            .remove(record)
            .map(|entry| (entry.action, entry.properties))
    }

    pub fn snapshot(&self, record: &R) -> Option<&PropertySnapshot<R>> {
        self.entries.get(record).map(|entry| &entry.properties)
    }

    pub fn action(&self, record: &R) -> Option<PendingAction> {
        self.entries.get(record).map(|entry| entry.action)
    }

    pub fn contains(&self, record: &R) -> bool {
        self.entries.contains_key(record)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether committing `record` now would produce a history entry.
    ///
    /// Created and deleted records always count as changed. A changed
    /// record counts only if some captured value differs from the
    /// record's current value. Records without a snapshot are clean.
    pub fn detect_changes(&self, record: &R) -> bool {
        let Some(entry) = self.entries.get(record) else {
            return false;
        };
        match entry.action {
            PendingAction::Create | PendingAction::Delete => true,
            PendingAction::Change => entry
                .properties
                .iter()
                .any(|(name, was)| *was != record.get_property(name)),
        }
    }

    /// Repoints every pending reference to `dead` at `alive`, including
    /// the key of a pending entry that belongs to `dead` itself.
    ///
    /// Only values that refer to `dead` are rewritten. Everything else stays
    /// exactly as captured, so unrelated deferred references are not
    /// resolved and still compare equal to the record's live value.
    pub(crate) fn replace_dead(&mut self, dead: &R, alive: &R) {
        for entry in self.entries.values_mut() {
            for value in entry.properties.values_mut() {
                if value.refers_to(dead) {
                    *value = value.replace_dead(dead, alive);
                }
            }
        }
        if let Some(entry) = self.entries.remove(dead) {
            self.entries.insert(alive.clone(), entry);
        }
    }
}

fn replace_in_snapshot<R: TrackedRecord>(snapshot: &mut PropertySnapshot<R>, dead: &R, alive: &R) {
    for value in snapshot.values_mut() {
        *value = value.replace_dead(dead, alive);
    }
}

/// One record's contribution to a committed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry<R> {
    pub record: R,
    pub action: PendingAction,
    /// Values captured before the change.
    pub old_properties: PropertySnapshot<R>,
    /// Values of the same keys at commit time.
    pub new_properties: PropertySnapshot<R>,
}

/// All entries produced by a single commit. Undone and redone as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitBatch<R> {
    /// Entries in the order their records were passed to `commit`.
    pub entries: Vec<BatchEntry<R>>,
    /// Monotonic sequence number assigned by the `ChangeTracker`.
    pub seq: u64,
}

impl<R: TrackedRecord> CommitBatch<R> {
    /// The batch's records in commit order.
    pub fn records(&self) -> Vec<R> {
        self.entries.iter().map(|entry| entry.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites references to `dead` in place, keeping entry order.
    pub(crate) fn replace_dead(&mut self, dead: &R, alive: &R) {
        for entry in &mut self.entries {
            if entry.record == *dead {
                entry.record = alive.clone();
            }
            replace_in_snapshot(&mut entry.old_properties, dead, alive);
            replace_in_snapshot(&mut entry.new_properties, dead, alive);
        }
    }
}
