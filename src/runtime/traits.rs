//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with in-memory implementations.

use crate::store::{KvBackend, SaveSnapshot, SaveStore};
use std::sync::Arc;

/// Persistence of the single save slot
///
/// Implementations never surface errors: failed writes are logged and
/// unreadable data reads as `None`.
pub trait SnapshotStore: Send + Sync {
    fn write(&self, snapshot: &SaveSnapshot);

    fn read(&self) -> Option<SaveSnapshot>;

    fn clear(&self);

    /// Whether anything is stored, without validating it
    fn has_snapshot(&self) -> bool;
}

impl<B: KvBackend> SnapshotStore for SaveStore<B> {
    fn write(&self, snapshot: &SaveSnapshot) {
        SaveStore::write(self, snapshot);
    }

    fn read(&self) -> Option<SaveSnapshot> {
        SaveStore::read(self)
    }

    fn clear(&self) {
        SaveStore::clear(self);
    }

    fn has_snapshot(&self) -> bool {
        SaveStore::has_snapshot(self)
    }
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn write(&self, snapshot: &SaveSnapshot) {
        (**self).write(snapshot);
    }

    fn read(&self) -> Option<SaveSnapshot> {
        (**self).read()
    }

    fn clear(&self) {
        (**self).clear();
    }

    fn has_snapshot(&self) -> bool {
        (**self).has_snapshot()
    }
}
