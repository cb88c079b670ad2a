/// Capabilities the tracker needs from the host.
use std::fmt::Debug;
use std::hash::Hash;

use anyhow::Result;

use crate::value::PropertyValue;

/// A handle to a host-owned record.
///
/// Handles compare and hash by record identity, not by content: two handles
/// are equal only if they point at the same live record. Reads and writes go
/// through `&self` because the host owns the record and the tracker only
/// holds references to it.
pub trait TrackedRecord: Clone + Eq + Hash + Debug {
    /// Reads the current value of `name`. Unknown properties read as null.
    fn get_property(&self, name: &str) -> PropertyValue<Self>;

    /// Writes `value` to `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record rejects the write.
    fn set_property(&self, name: &str, value: PropertyValue<Self>) -> Result<()>;
}

/// Host operations the tracker delegates to.
///
/// Every method is required, so an adapter that lacks a capability does not
/// compile. Runtime failures are surfaced to the caller as
/// `TrackerError::Adapter`.
pub trait RecordAdapter {
    type Record: TrackedRecord;

    /// Lists the properties to snapshot when `begin` is called without an
    /// explicit list: the record's own attributes plus single-valued
    /// (belongs-to) relationships. Collection relationships are excluded.
    fn detect_properties(&self, record: &Self::Record) -> Result<Vec<String>>;

    /// Removes the record (or marks it deleted).
    fn delete_record(&self, record: &Self::Record) -> Result<()>;

    /// Creates a fresh live record to stand in for `dead`.
    fn reincarnate_record(&self, dead: &Self::Record) -> Result<Self::Record>;
}
