use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::index::{IndexBuilder, IndexSnapshot, IndexStore};
use crate::{Error, Result};

/// Process-wide access point to the current [`IndexSnapshot`].
///
/// Readers take an `Arc` to whatever snapshot is current and keep using it
/// even if a rebuild publishes a newer one meanwhile. Publishing swaps the
/// pointer under a write lock, so a reader never observes a half-built index.
///
/// # Usage
///
/// ```ignore
/// let handle = SnapshotHandle::new();
/// handle.init(&store, &builder)?;
///
/// let snapshot = handle.current()?;
/// // ... query snapshot ...
///
/// handle.rebuild(&store, &builder)?;
/// handle.teardown();
/// ```
#[derive(Debug, Default)]
pub struct SnapshotHandle {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl SnapshotHandle {
    /// Create a handle with no snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted snapshot or build one, then publish it.
    pub fn init(&self, store: &IndexStore, builder: &IndexBuilder<'_>) -> Result<Arc<IndexSnapshot>> {
        let snapshot = store.open_or_build(builder)?;
        Ok(self.publish(snapshot))
    }

    /// Rebuild from the corpus, persist, then swap the new snapshot in.
    ///
    /// On failure the previously published snapshot stays current.
    pub fn rebuild(&self, store: &IndexStore, builder: &IndexBuilder<'_>) -> Result<Arc<IndexSnapshot>> {
        let snapshot = store.rebuild(builder)?;
        Ok(self.publish(snapshot))
    }

    /// Make `snapshot` the current one and return it.
    pub fn publish(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&snapshot));
        info!(chunks = snapshot.len(), "published index snapshot");
        snapshot
    }

    /// The current snapshot.
    ///
    /// Fails with [`Error::IndexUnavailable`] before `init` or after `teardown`.
    pub fn current(&self) -> Result<Arc<IndexSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Error::IndexUnavailable("no index snapshot is loaded".into()))
    }

    /// Release the current snapshot. In-flight readers keep theirs.
    pub fn teardown(&self) -> Option<Arc<IndexSnapshot>> {
        let released = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            info!("released index snapshot");
        }
        released
    }
}
