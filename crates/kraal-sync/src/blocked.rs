use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use kraal_store::KvStore;
use serde::{Deserialize, Serialize};

use crate::util::now_ms;

/// A queued write that cannot proceed until a specific placeholder resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedWrite {
    pub write_key: String,
    pub unresolved_temp_id: String,
    pub description: String,
    pub blocked_at_ms: u64,
}

/// Handle returned by [`BlockedWriteTracker::on_change`]; pass it back to
/// [`BlockedWriteTracker::remove_listener`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&[BlockedWrite]) + Send + Sync>;

/// Tracks writes stuck on an unresolved dependency, persists them as one
/// flat collection, and pushes the full current snapshot to every subscriber
/// on each state change.
///
/// At most one record exists per `write_key`; re-marking replaces it. There
/// is no automatic timeout, and registering a mapping on the resolver does
/// not clear records referencing the newly resolved placeholder — that
/// orchestration belongs to the caller (see DESIGN.md).
pub struct BlockedWriteTracker<S> {
    store: Arc<S>,
    storage_key: String,
    records: IndexMap<String, BlockedWrite>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    loaded: bool,
}

impl<S> fmt::Debug for BlockedWriteTracker<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockedWriteTracker")
            .field("storage_key", &self.storage_key)
            .field("records", &self.records.len())
            .field("listeners", &self.listeners.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl<S: KvStore> BlockedWriteTracker<S> {
    pub fn new(store: Arc<S>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            records: IndexMap::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            loaded: false,
        }
    }

    /// Loads the persisted blocked-write collection on first call; later
    /// calls are no-ops. An unavailable store means starting empty.
    pub async fn init(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        match self
            .store
            .get_doc::<Vec<BlockedWrite>>(&self.storage_key)
            .await
        {
            Ok(Some(records)) => {
                self.records = records
                    .into_iter()
                    .map(|r| (r.write_key.clone(), r))
                    .collect();
                tracing::debug!(count = self.records.len(), "loaded blocked writes");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "blocked-write store unavailable; continuing in memory");
            }
        }
    }

    /// Creates or replaces the record for `write_key`, persists
    /// fire-and-forget, and notifies subscribers.
    pub async fn mark_blocked(
        &mut self,
        write_key: impl Into<String>,
        unresolved_temp_id: impl Into<String>,
        description: impl Into<String>,
    ) {
        let record = BlockedWrite {
            write_key: write_key.into(),
            unresolved_temp_id: unresolved_temp_id.into(),
            description: description.into(),
            blocked_at_ms: now_ms(),
        };
        tracing::debug!(
            write_key = %record.write_key,
            temp_id = %record.unresolved_temp_id,
            "write blocked on unresolved dependency"
        );
        self.records.insert(record.write_key.clone(), record);
        self.persist().await;
        self.notify();
    }

    /// Removes the record for `write_key`. Returns `false` (with no
    /// persistence write and no notification) when the key was not blocked.
    pub async fn unblock(&mut self, write_key: &str) -> bool {
        if self.records.shift_remove(write_key).is_none() {
            return false;
        }
        tracing::debug!(write_key, "write unblocked");
        self.persist().await;
        self.notify();
        true
    }

    /// Snapshot of the current blocked-write records.
    pub fn list_blocked(&self) -> Vec<BlockedWrite> {
        self.records.values().cloned().collect()
    }

    /// Registers a listener invoked synchronously with the full snapshot on
    /// every change. Listeners are independent; each registration gets its
    /// own [`ListenerId`].
    pub fn on_change(
        &mut self,
        listener: impl Fn(&[BlockedWrite]) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&self) {
        let snapshot = self.list_blocked();
        for (_, listener) in &self.listeners {
            listener(&snapshot);
        }
    }

    async fn persist(&self) {
        let records: Vec<&BlockedWrite> = self.records.values().collect();
        if let Err(err) = self.store.put_doc(&self.storage_key, &records).await {
            tracing::warn!(%err, "failed to persist blocked writes; keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraal_store::MemStore;

    fn tracker() -> BlockedWriteTracker<MemStore> {
        BlockedWriteTracker::new(Arc::new(MemStore::new()), "blocked")
    }

    #[tokio::test]
    async fn remark_replaces_existing_record() {
        let mut t = tracker();
        t.mark_blocked("m1", "temp-batch-1", "waiting on batch").await;
        t.mark_blocked("m1", "temp-batch-2", "waiting on other batch")
            .await;

        let blocked = t.list_blocked();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].unresolved_temp_id, "temp-batch-2");
    }

    #[tokio::test]
    async fn unblock_unknown_key_is_a_silent_noop() {
        let mut t = tracker();
        assert!(!t.unblock("missing").await);
    }

    #[tokio::test]
    async fn removed_listener_stops_receiving() {
        use std::sync::Mutex;

        let mut t = tracker();
        let seen = Arc::new(Mutex::new(0u32));
        let seen_in_listener = Arc::clone(&seen);
        let id = t.on_change(move |_| {
            *seen_in_listener.lock().unwrap() += 1;
        });

        t.mark_blocked("m1", "temp-batch-1", "waiting").await;
        t.remove_listener(id);
        t.unblock("m1").await;

        assert_eq!(*seen.lock().unwrap(), 1);
    }
}
