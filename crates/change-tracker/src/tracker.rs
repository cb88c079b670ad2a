/// Core change tracker: pending snapshots, commit, rollback, undo and redo.
///
/// Hosts call `begin` (or `did_create` / `did_delete`) before mutating a
/// record, then either `commit` the records to make the edit undoable or
/// `rollback` to discard it. Committed batches move between the undo and
/// redo stacks as they are undone and redone.
use crate::config::TrackerConfig;
use crate::error::{AdapterOperation, Result, TrackerError};
use crate::events::{ChangeKind, EventKind, EventSink, SubscriptionId, TrackerEvent};
use crate::record::{RecordAdapter, TrackedRecord};
use crate::snapshot::{
    read_properties, BatchEntry, CommitBatch, PendingAction, PropertySnapshot, SnapshotStore,
};

/// Writes every captured value back onto `record`.
fn restore<R: TrackedRecord>(record: &R, snapshot: &PropertySnapshot<R>) -> Result<()> {
    for (name, value) in snapshot {
        record
            .set_property(name, value.clone())
            .map_err(|source| TrackerError::Restore {
                property: name.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Tracks uncommitted edits and undo/redo history for a set of records.
///
/// Each tracker owns its own snapshots, stacks and listeners; separate
/// trackers share nothing. All operations run synchronously to completion.
/// Listeners must not call back into the tracker that notified them.
pub struct ChangeTracker<A: RecordAdapter> {
    /// Host capabilities.
    adapter: A,
    /// Uncommitted snapshots keyed by record.
    pending: SnapshotStore<A::Record>,
    /// Committed batches, oldest first.
    undo_stack: Vec<CommitBatch<A::Record>>,
    /// Undone batches, most recently undone on top.
    redo_stack: Vec<CommitBatch<A::Record>>,
    /// Next sequence number to assign to new batches.
    next_seq: u64,
    config: TrackerConfig,
    events: EventSink<A::Record>,
}

impl<A: RecordAdapter> std::fmt::Debug for ChangeTracker<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("pending_len", &self.pending.len())
            .field("undo_len", &self.undo_stack.len())
            .field("redo_len", &self.redo_stack.len())
            .field("next_seq", &self.next_seq)
            .field("config", &self.config)
            .finish()
    }
}

impl<A: RecordAdapter> ChangeTracker<A> {
    /// Creates a tracker with unbounded history.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, TrackerConfig::default())
    }

    pub fn with_config(adapter: A, config: TrackerConfig) -> Self {
        Self {
            adapter,
            pending: SnapshotStore::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            next_seq: 0,
            config,
            events: EventSink::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // --- Pending changes ---

    /// Marks `record` as about to change and captures its current values.
    ///
    /// An empty `properties` list asks the adapter which properties to
    /// capture. Values already captured since the last commit are kept.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Adapter` if property detection fails; nothing
    /// is captured in that case.
    pub fn begin(&mut self, record: &A::Record, properties: &[&str]) -> Result<()> {
        let result = self.capture(record, properties);
        self.notify_pending();
        result
    }

    /// Like `begin`, but classifies the record as newly created.
    pub fn did_create(&mut self, record: &A::Record, properties: &[&str]) -> Result<()> {
        self.begin_as(record, properties, PendingAction::Create)
    }

    /// Like `begin`, but classifies the record as deleted.
    pub fn did_delete(&mut self, record: &A::Record, properties: &[&str]) -> Result<()> {
        self.begin_as(record, properties, PendingAction::Delete)
    }

    fn begin_as(
        &mut self,
        record: &A::Record,
        properties: &[&str],
        action: PendingAction,
    ) -> Result<()> {
        let result = self.capture(record, properties);
        if result.is_ok() {
            self.pending.mark(record, action);
        }
        self.notify_pending();
        result
    }

    fn capture(&mut self, record: &A::Record, properties: &[&str]) -> Result<()> {
        let names: Vec<String> = if properties.is_empty() {
            self.adapter
                .detect_properties(record)
                .map_err(|e| TrackerError::adapter(AdapterOperation::DetectProperties, e))?
        } else {
            properties.iter().map(|name| name.to_string()).collect()
        };
        tracing::debug!(?record, properties = ?names, "Capturing snapshot");
        self.pending.capture(record, &names);
        Ok(())
    }

    /// Whether committing `record` now would add it to history.
    pub fn detect_changes(&self, record: &A::Record) -> bool {
        self.pending.detect_changes(record)
    }

    // --- Commit / rollback ---

    /// Commits the pending changes of `records` as one undoable batch.
    ///
    /// Records whose values did not actually change are left out of the
    /// batch, but their pending state is cleared all the same. Returns
    /// `true` if a batch was pushed onto the undo stack; doing so clears
    /// the redo stack.
    pub fn commit(&mut self, records: &[A::Record]) -> bool {
        let mut entries = Vec::new();
        for record in records {
            let changed = self.pending.detect_changes(record);
            let Some((action, old_properties)) = self.pending.take(record) else {
                continue;
            };
            if changed {
                let new_properties = read_properties(record, old_properties.keys());
                entries.push(BatchEntry {
                    record: record.clone(),
                    action,
                    old_properties,
                    new_properties,
                });
            }
        }

        let committed = !entries.is_empty();
        if committed {
            let batch = CommitBatch {
                entries,
                seq: self.next_seq,
            };
            self.next_seq += 1;
            tracing::debug!(seq = batch.seq, entries = batch.len(), "Committed batch");

            let records = batch.records();
            self.undo_stack.push(batch);
            self.redo_stack.clear();
            self.enforce_depth();

            self.events.emit(&TrackerEvent::Change {
                kind: ChangeKind::Commit,
                records,
            });
            self.notify_history();
        }
        self.notify_pending();
        committed
    }

    /// Reverts the uncommitted changes of `records` without touching history.
    ///
    /// A pending create deletes the record, a pending delete reincarnates it
    /// and restores its captured values, and a pending change restores the
    /// captured values. Records without pending changes are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first record that fails. Records before it are rolled
    /// back; it and the records after it keep their pending state.
    pub fn rollback(&mut self, records: &[A::Record]) -> Result<()> {
        let result = records
            .iter()
            .try_for_each(|record| self.rollback_record(record));
        if let Err(e) = &result {
            tracing::warn!("Rollback stopped early: {e}");
        }
        self.notify_pending();
        result
    }

    fn rollback_record(&mut self, record: &A::Record) -> Result<()> {
        let Some(action) = self.pending.action(record) else {
            tracing::debug!(?record, "Nothing to roll back");
            return Ok(());
        };

        let live = match action {
            PendingAction::Create => {
                self.adapter
                    .delete_record(record)
                    .map_err(|e| TrackerError::adapter(AdapterOperation::DeleteRecord, e))?;
                record.clone()
            }
            PendingAction::Delete => self.reincarnate(record, None)?,
            PendingAction::Change => record.clone(),
        };

        if action != PendingAction::Create {
            if let Some(snapshot) = self.pending.snapshot(&live) {
                restore(&live, snapshot)?;
            }
        }
        self.pending.take(&live);
        Ok(())
    }

    // --- Undo / redo ---

    /// Undoes the most recently committed batch.
    ///
    /// Entries are reverted last-first. Returns the batch's records in
    /// commit order, with reincarnated records in place of deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `NothingToUndo` if the undo stack is empty. If reverting an
    /// entry fails, entries already reverted stay reverted and the batch is
    /// put back on the undo stack.
    pub fn undo(&mut self) -> Result<Vec<A::Record>> {
        let mut batch = self.undo_stack.pop().ok_or(TrackerError::NothingToUndo)?;

        for index in (0..batch.entries.len()).rev() {
            if let Err(e) = self.undo_entry(&mut batch, index) {
                tracing::warn!(seq = batch.seq, "Failed to undo batch: {e}");
                self.undo_stack.push(batch);
                return Err(e);
            }
        }

        tracing::debug!(seq = batch.seq, "Undid batch");
        let records = batch.records();
        self.redo_stack.push(batch);

        self.events.emit(&TrackerEvent::Change {
            kind: ChangeKind::Undo,
            records: records.clone(),
        });
        self.events.emit(&TrackerEvent::Undo {
            records: records.clone(),
        });
        self.notify_history();
        Ok(records)
    }

    /// Redoes the most recently undone batch.
    ///
    /// Entries are re-applied in commit order. Returns the batch's records,
    /// with reincarnated records in place of deleted ones.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRedo` if the redo stack is empty. If re-applying an
    /// entry fails, entries already re-applied stay applied and the batch is
    /// put back on the redo stack.
    pub fn redo(&mut self) -> Result<Vec<A::Record>> {
        let mut batch = self.redo_stack.pop().ok_or(TrackerError::NothingToRedo)?;

        for index in 0..batch.entries.len() {
            if let Err(e) = self.redo_entry(&mut batch, index) {
                tracing::warn!(seq = batch.seq, "Failed to redo batch: {e}");
                self.redo_stack.push(batch);
                return Err(e);
            }
        }

        tracing::debug!(seq = batch.seq, "Redid batch");
        let records = batch.records();
        self.undo_stack.push(batch);

        self.events.emit(&TrackerEvent::Change {
            kind: ChangeKind::Redo,
            records: records.clone(),
        });
        self.events.emit(&TrackerEvent::Redo {
            records: records.clone(),
        });
        self.notify_history();
        Ok(records)
    }

    fn undo_entry(&mut self, batch: &mut CommitBatch<A::Record>, index: usize) -> Result<()> {
        let action = batch.entries[index].action;
        let record = batch.entries[index].record.clone();
        match action {
            PendingAction::Create => self
                .adapter
                .delete_record(&record)
                .map_err(|e| TrackerError::adapter(AdapterOperation::DeleteRecord, e)),
            PendingAction::Delete => {
                let alive = self.reincarnate(&record, Some(&mut *batch))?;
                restore(&alive, &batch.entries[index].old_properties)
            }
            PendingAction::Change => restore(&record, &batch.entries[index].old_properties),
        }
    }

    fn redo_entry(&mut self, batch: &mut CommitBatch<A::Record>, index: usize) -> Result<()> {
        let action = batch.entries[index].action;
        let record = batch.entries[index].record.clone();
        match action {
            PendingAction::Delete => self
                .adapter
                .delete_record(&record)
                .map_err(|e| TrackerError::adapter(AdapterOperation::DeleteRecord, e)),
            PendingAction::Create => {
                let alive = self.reincarnate(&record, Some(&mut *batch))?;
                restore(&alive, &batch.entries[index].new_properties)
            }
            PendingAction::Change => restore(&record, &batch.entries[index].new_properties),
        }
    }

    /// Brings `dead` back through the adapter and repoints all history at
    /// the replacement.
    ///
    /// Patches both stacks, the batch currently being applied (which is
    /// off-stack while it is applied) and pending snapshots.
    fn reincarnate(
        &mut self,
        dead: &A::Record,
        in_flight: Option<&mut CommitBatch<A::Record>>,
    ) -> Result<A::Record> {
        let alive = self
            .adapter
            .reincarnate_record(dead)
            .map_err(|e| TrackerError::adapter(AdapterOperation::ReincarnateRecord, e))?;
        tracing::debug!(?dead, ?alive, "Reincarnated record");

        for batch in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            batch.replace_dead(dead, &alive);
        }
        if let Some(batch) = in_flight {
            batch.replace_dead(dead, &alive);
        }
        self.pending.replace_dead(dead, &alive);
        tracing::trace!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "Patched history references"
        );
        Ok(alive)
    }

    /// Drops both history stacks. Pending snapshots are kept.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify_history();
    }

    /// Evicts the oldest undo batches beyond `max_history_depth`.
    ///
    /// A depth of zero evicts every batch as soon as it is committed; the
    /// commit still reports success and notifies listeners.
    fn enforce_depth(&mut self) {
        if let Some(max) = self.config.max_history_depth {
            if self.undo_stack.len() > max {
                let excess = self.undo_stack.len() - max;
                self.undo_stack.drain(..excess);
                tracing::debug!(evicted = excess, "Trimmed undo history");
            }
        }
    }

    // --- State ---

    /// Whether any record has uncommitted changes.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_snapshot(&self, record: &A::Record) -> Option<&PropertySnapshot<A::Record>> {
        self.pending.snapshot(record)
    }

    pub fn pending_action(&self, record: &A::Record) -> Option<PendingAction> {
        self.pending.action(record)
    }

    pub fn undo_available(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn redo_available(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Committed batches, oldest first.
    pub fn undo_stack(&self) -> &[CommitBatch<A::Record>] {
        &self.undo_stack
    }

    /// Undone batches, next to redo last.
    pub fn redo_stack(&self) -> &[CommitBatch<A::Record>] {
        &self.redo_stack
    }

    // --- Events ---

    /// Registers `listener` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&TrackerEvent<A::Record>) + 'static,
    {
        self.events.subscribe(kind, Box::new(listener))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn notify_pending(&mut self) {
        let has_pending = self.has_pending_changes();
        self.events
            .emit(&TrackerEvent::PendingChanged { has_pending });
    }

    fn notify_history(&mut self) {
        let event = TrackerEvent::HistoryChanged {
            undo_available: self.undo_available(),
            redo_available: self.redo_available(),
        };
        self.events.emit(&event);
    }
}
