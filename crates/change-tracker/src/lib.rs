/// Undo/redo change tracking for mutable in-memory records.
///
/// Provides a `ChangeTracker` that captures "before" values when a host
/// announces an edit, folds committed edits into undoable batches, and
/// replays those batches backwards and forwards. Records that were deleted
/// and later brought back are reincarnated through the host's
/// `RecordAdapter`, and every stored reference to the dead record is
/// repointed at its replacement.
pub mod config;
pub mod error;
pub mod events;
pub mod record;
pub mod snapshot;
pub mod tracker;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use config::TrackerConfig;
pub use error::{AdapterOperation, Result, TrackerError};
pub use events::{ChangeKind, EventKind, EventSink, Listener, SubscriptionId, TrackerEvent};
pub use record::{RecordAdapter, TrackedRecord};
pub use snapshot::{BatchEntry, CommitBatch, PendingAction, PropertySnapshot, SnapshotStore};
pub use tracker::ChangeTracker;
pub use value::{DeferredRecord, PropertyValue};
