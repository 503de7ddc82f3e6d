use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::engagement::domain::snapshot::Snapshot;

/// Producer side of the published snapshot.
///
/// Holds a single `ArcSwap<Snapshot>` slot. Publishing stores a new pointer;
/// readers load the current one. Neither side takes a lock, so a reader never
/// waits on the producer and always gets one complete snapshot, either the
/// previous or the next, never a mix.
///
/// Not `Clone`: there is exactly one producer. Hand out [`SnapshotReader`]s
/// for everyone else. Dropping the publisher marks the snapshot finished.
pub struct SnapshotPublisher {
    slot: Arc<ArcSwap<Snapshot>>,
}

/// Cheap, cloneable read handle onto the latest published snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    slot: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotPublisher {
    /// Creates a publisher whose initial snapshot is [`Snapshot::empty`].
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ArcSwap::from_pointee(Snapshot::empty())),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Replaces the published snapshot wholesale.
    pub fn publish(&self, snapshot: Snapshot) {
        self.slot.store(Arc::new(snapshot));
    }

    /// Republishes the current snapshot with `live = false`.
    pub fn finish(&self) {
        let current = self.latest();
        if current.live {
            self.publish(current.finished());
        }
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SnapshotPublisher {
    fn drop(&mut self) {
        self.finish();
    }
}

impl SnapshotReader {
    /// Returns the most recently published snapshot.
    pub fn get_snapshot(&self) -> Arc<Snapshot> {
        self.slot.load_full()
    }
}
