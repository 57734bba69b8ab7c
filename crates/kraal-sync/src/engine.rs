use std::sync::Arc;
use std::time::Duration;

use kraal_store::KvStore;

use crate::blocked::BlockedWriteTracker;
use crate::reconcile::{self, QueuedWrite};
use crate::resolver::{DEFAULT_MAPPING_RETENTION, TempIdResolver};

/// Storage keys and retention policy for one sync engine instance.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mapping_retention: Duration,
    pub mappings_key: String,
    pub blocked_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mapping_retention: DEFAULT_MAPPING_RETENTION,
            mappings_key: "temp_id_mappings".into(),
            blocked_key: "blocked_writes".into(),
        }
    }
}

/// Composition root for the offline sync core: one resolver and one blocked
/// write tracker over a shared store, constructed explicitly by the
/// application root and passed by reference to consumers.
///
/// Registering a mapping does not clear blocked records referencing the
/// newly resolved placeholder; callers that want that behavior consult
/// `tracker().list_blocked()` and unblock explicitly (see DESIGN.md).
pub struct SyncEngine<S> {
    config: SyncConfig,
    resolver: TempIdResolver<S>,
    tracker: BlockedWriteTracker<S>,
}

impl<S: KvStore> SyncEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, SyncConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: SyncConfig) -> Self {
        let resolver = TempIdResolver::new(Arc::clone(&store), config.mappings_key.clone());
        let tracker = BlockedWriteTracker::new(store, config.blocked_key.clone());
        Self {
            config,
            resolver,
            tracker,
        }
    }

    /// Loads both persisted collections. Idempotent; an unavailable store
    /// only means the engine runs in memory.
    pub async fn init(&mut self) {
        self.resolver.init().await;
        self.tracker.init().await;
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TempIdResolver<S> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut TempIdResolver<S> {
        &mut self.resolver
    }

    pub fn tracker(&self) -> &BlockedWriteTracker<S> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut BlockedWriteTracker<S> {
        &mut self.tracker
    }

    /// Rewrites queued payloads against the current mapping table; see
    /// [`reconcile::reconcile_pending`].
    pub fn reconcile_pending(&self, writes: &mut [QueuedWrite]) -> usize {
        reconcile::reconcile_pending(&self.resolver, writes)
    }

    /// Sweeps mappings older than the configured retention window.
    pub async fn sweep_expired_mappings(&mut self) {
        let max_age = self.config.mapping_retention;
        self.resolver.clear_old(max_age).await;
    }
}
