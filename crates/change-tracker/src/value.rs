/// Property values captured in snapshots.
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A single property value as seen by the tracker.
///
/// Plain data is opaque to the tracker and compared with `==`. Record
/// references are kept separately so they can be repointed when a deleted
/// record is reincarnated.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<R> {
    /// Host data (strings, numbers, null, ...).
    Data(serde_json::Value),
    /// Direct reference to another record.
    Record(R),
    /// Reference that may not have been resolved yet.
    Deferred(DeferredRecord<R>),
}

impl<R> PropertyValue<R> {
    /// The null value. Also stands in for missing properties.
    pub fn null() -> Self {
        Self::Data(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Data(serde_json::Value::Null))
    }

}

impl<R: Clone + PartialEq> PropertyValue<R> {
    /// Whether this value points at `target`, directly or through a
    /// fulfilled deferred reference.
    pub fn refers_to(&self, target: &R) -> bool {
        match self {
            Self::Record(record) => record == target,
            Self::Deferred(deferred) => deferred.resolve().as_ref() == Some(target),
            Self::Data(_) => false,
        }
    }

    /// Repoints references to `dead` at `alive`.
    ///
    /// Deferred references are resolved first: a resolved target becomes a
    /// direct reference (then substituted if it is `dead`), and a deferred
    /// reference with no target collapses to null.
    pub fn replace_dead(&self, dead: &R, alive: &R) -> Self {
        match self {
            Self::Record(record) if record == dead => Self::Record(alive.clone()),
            Self::Deferred(deferred) => match deferred.resolve() {
                Some(target) if &target == dead => Self::Record(alive.clone()),
                Some(target) => Self::Record(target),
                None => Self::null(),
            },
            other => other.clone(),
        }
    }
}

impl<R> From<serde_json::Value> for PropertyValue<R> {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

impl<R> From<&str> for PropertyValue<R> {
    fn from(value: &str) -> Self {
        Self::Data(serde_json::Value::from(value))
    }
}

impl<R> From<i64> for PropertyValue<R> {
    fn from(value: i64) -> Self {
        Self::Data(serde_json::Value::from(value))
    }
}

impl<R> From<bool> for PropertyValue<R> {
    fn from(value: bool) -> Self {
        Self::Data(serde_json::Value::from(value))
    }
}

/// A shared slot holding a record reference that may be fulfilled later.
///
/// Clones share the slot, so fulfilling one fulfills all of them. Two
/// deferred references are equal only when they share the same slot.
pub struct DeferredRecord<R> {
    slot: Rc<RefCell<Option<R>>>,
}

impl<R> DeferredRecord<R> {
    /// Creates an unfulfilled reference.
    pub fn pending() -> Self {
        Self {
            slot: Rc::new(RefCell::new(None)),
        }
    }

    /// Creates a reference that already points at `target`.
    pub fn resolved(target: R) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(target))),
        }
    }

    /// Fulfills the reference, replacing any previous target.
    pub fn fulfill(&self, target: R) {
        *self.slot.borrow_mut() = Some(target);
    }

    pub fn is_fulfilled(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

impl<R: Clone> DeferredRecord<R> {
    /// Returns the current target, or `None` if nothing was fulfilled.
    pub fn resolve(&self) -> Option<R> {
        self.slot.borrow().clone()
    }
}

impl<R> Clone for DeferredRecord<R> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<R> PartialEq for DeferredRecord<R> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<R: fmt::Debug> fmt::Debug for DeferredRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredRecord")
            .field("target", &*self.slot.borrow())
            .finish()
    }
}
