/// In-memory record store for hosting a `ChangeTracker`.
///
/// Provides model schemas (attributes, belongs-to and has-many
/// relationships), identity-compared `StoreRecord` handles, and a
/// `StoreAdapter` that lets the tracker delete and reincarnate records.
pub mod adapter;
pub mod model;
pub mod record;
pub mod store;

pub use adapter::StoreAdapter;
pub use model::{ModelSchema, Relationship, RelationshipKind};
pub use record::StoreRecord;
pub use store::MemoryStore;

/// A change tracker over a `MemoryStore`.
pub type StoreTracker = change_tracker::ChangeTracker<StoreAdapter>;
