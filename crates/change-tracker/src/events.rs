/// Observer registration and event delivery.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which history operation produced a `Change` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Commit,
    Undo,
    Redo,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commit => "commit",
            Self::Undo => "undo",
            Self::Redo => "redo",
        };
        f.write_str(name)
    }
}

/// Event categories listeners subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Undo,
    Redo,
    PendingChanged,
    HistoryChanged,
}

/// Notifications emitted by a `ChangeTracker`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent<R> {
    /// Emitted on every commit, undo and redo that touched history.
    Change { kind: ChangeKind, records: Vec<R> },
    /// Emitted after `Change` when a batch was undone.
    Undo { records: Vec<R> },
    /// Emitted after `Change` when a batch was redone.
    Redo { records: Vec<R> },
    /// The set of uncommitted records may have changed.
    PendingChanged { has_pending: bool },
    /// One of the history stacks changed.
    HistoryChanged {
        undo_available: bool,
        redo_available: bool,
    },
}

impl<R> TrackerEvent<R> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Change { .. } => EventKind::Change,
            Self::Undo { .. } => EventKind::Undo,
            Self::Redo { .. } => EventKind::Redo,
            Self::PendingChanged { .. } => EventKind::PendingChanged,
            Self::HistoryChanged { .. } => EventKind::HistoryChanged,
        }
    }
}

/// Callback invoked with each matching event.
pub type Listener<R> = Box<dyn FnMut(&TrackerEvent<R>)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Per-tracker listener registry.
///
/// Listeners run synchronously in registration order.
pub struct EventSink<R> {
    listeners: Vec<(SubscriptionId, EventKind, Listener<R>)>,
    next_id: u64,
}

impl<R> Default for EventSink<R> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<R> fmt::Debug for EventSink<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<R> EventSink<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener<R>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Delivers `event` to every listener subscribed to its kind.
    pub fn emit(&mut self, event: &TrackerEvent<R>) {
        let kind = event.kind();
        for (_, listener_kind, listener) in &mut self.listeners {
            if *listener_kind == kind {
                listener(event);
            }
        }
    }
}
