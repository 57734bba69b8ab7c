use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use kraal_store::KvStore;
use serde::{Deserialize, Serialize};

use crate::temp_id::EntityKind;
use crate::util::now_ms;

/// Default retention window for mappings. Abandoned placeholders that never
/// resolve are swept on the same schedule so they cannot accumulate forever.
pub const DEFAULT_MAPPING_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Durable link between a client-minted placeholder and the canonical
/// identifier the backend assigned once the owning entity synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub temp_id: String,
    pub canonical_id: String,
    pub kind: EntityKind,
    pub created_at_ms: u64,
}

/// Narrow seam between the resolver and consumers that only need
/// placeholder -> canonical resolution (the substitution walker and the
/// pending-write reconciler dispatch through it).
pub trait TempIdLookup {
    /// Canonical ID for `temp_id`, or `None` while the owning entity has not
    /// synced.
    fn lookup(&self, temp_id: &str) -> Option<&str>;

    fn is_resolved(&self, temp_id: &str) -> bool {
        self.lookup(temp_id).is_some()
    }
}

impl TempIdLookup for HashMap<String, String> {
    fn lookup(&self, temp_id: &str) -> Option<&str> {
        self.get(temp_id).map(String::as_str)
    }
}

/// Authoritative in-memory placeholder -> canonical table, persisted as one
/// flat collection behind a [`KvStore`].
///
/// All mutating operations update memory first and persist fire-and-forget:
/// a store failure downgrades the resolver to memory-only operation and is
/// never surfaced to the caller.
pub struct TempIdResolver<S> {
    store: Arc<S>,
    storage_key: String,
    mappings: IndexMap<String, Mapping>,
    loaded: bool,
}

impl<S> fmt::Debug for TempIdResolver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempIdResolver")
            .field("storage_key", &self.storage_key)
            .field("mappings", &self.mappings.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl<S: KvStore> TempIdResolver<S> {
    pub fn new(store: Arc<S>, storage_key: impl Into<String>) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            mappings: IndexMap::new(),
            loaded: false,
        }
    }

    /// Loads the persisted mapping collection on first call; later calls are
    /// no-ops. An unavailable store only means the resolver starts empty and
    /// runs in memory.
    pub async fn init(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        match self.store.get_doc::<Vec<Mapping>>(&self.storage_key).await {
            Ok(Some(records)) => {
                self.mappings = records
                    .into_iter()
                    .map(|m| (m.temp_id.clone(), m))
                    .collect();
                tracing::debug!(count = self.mappings.len(), "loaded temp-id mappings");
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%err, "mapping store unavailable; continuing in memory");
            }
        }
    }

    /// Records the canonical ID for a placeholder. Re-registration for the
    /// same placeholder overwrites the prior record (last write wins).
    pub async fn register(
        &mut self,
        temp_id: impl Into<String>,
        canonical_id: impl Into<String>,
        kind: impl Into<EntityKind>,
    ) {
        let temp_id = temp_id.into();
        let mapping = Mapping {
            temp_id: temp_id.clone(),
            canonical_id: canonical_id.into(),
            kind: kind.into(),
            created_at_ms: now_ms(),
        };
        tracing::debug!(
            temp_id = %mapping.temp_id,
            canonical_id = %mapping.canonical_id,
            kind = %mapping.kind,
            "registered temp-id mapping"
        );
        self.mappings.insert(temp_id, mapping);
        self.persist().await;
    }

    /// Canonical ID if mapped, otherwise the input unchanged. Identity for
    /// any string that is not a known placeholder.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.lookup(id).unwrap_or(id)
    }

    pub fn is_resolved(&self, id: &str) -> bool {
        self.mappings.contains_key(id)
    }

    pub fn mappings_for_kind(&self, kind: &EntityKind) -> Vec<Mapping> {
        self.mappings
            .values()
            .filter(|m| &m.kind == kind)
            .cloned()
            .collect()
    }

    pub fn all_mappings(&self) -> Vec<Mapping> {
        self.mappings.values().cloned().collect()
    }

    pub async fn clear(&mut self, temp_id: &str) {
        self.mappings.shift_remove(temp_id);
        self.persist().await;
    }

    pub async fn clear_all(&mut self) {
        self.mappings.clear();
        self.persist().await;
    }

    /// Sweeps mappings whose age strictly exceeds `max_age`; a record aged
    /// exactly `max_age` survives. Persists only when the sweep removed
    /// anything.
    pub async fn clear_old(&mut self, max_age: Duration) {
        let now = now_ms();
        let before = self.mappings.len();
        self.mappings.retain(|_, m| !is_expired(m, now, max_age));
        let removed = before - self.mappings.len();
        if removed > 0 {
            tracing::info!(removed, "swept expired temp-id mappings");
            self.persist().await;
        }
    }

    async fn persist(&self) {
        let records: Vec<&Mapping> = self.mappings.values().collect();
        if let Err(err) = self.store.put_doc(&self.storage_key, &records).await {
            tracing::warn!(%err, "failed to persist temp-id mappings; keeping in-memory state");
        }
    }
}

impl<S: KvStore> TempIdLookup for TempIdResolver<S> {
    fn lookup(&self, temp_id: &str) -> Option<&str> {
        self.mappings.get(temp_id).map(|m| m.canonical_id.as_str())
    }
}

/// Strict `>` so a mapping aged exactly `max_age` is retained.
fn is_expired(mapping: &Mapping, now_ms: u64, max_age: Duration) -> bool {
    let age_ms = u128::from(now_ms.saturating_sub(mapping.created_at_ms));
    age_ms > max_age.as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraal_store::MemStore;

    fn resolver() -> TempIdResolver<MemStore> {
        TempIdResolver::new(Arc::new(MemStore::new()), "mappings")
    }

    #[tokio::test]
    async fn resolve_is_identity_for_unmapped_ids() {
        let r = resolver();
        assert_eq!(r.resolve("srv-123"), "srv-123");
        assert_eq!(r.resolve("temp-batch-unknown"), "temp-batch-unknown");
        assert!(!r.is_resolved("temp-batch-unknown"));
    }

    #[tokio::test]
    async fn register_then_resolve_and_clear() {
        let mut r = resolver();
        r.register("temp-batch-abc", "srv-123", EntityKind::BATCH)
            .await;
        assert_eq!(r.resolve("temp-batch-abc"), "srv-123");
        assert!(r.is_resolved("temp-batch-abc"));

        r.clear("temp-batch-abc").await;
        assert_eq!(r.resolve("temp-batch-abc"), "temp-batch-abc");
        assert!(!r.is_resolved("temp-batch-abc"));
    }

    #[tokio::test]
    async fn reregistration_overwrites() {
        let mut r = resolver();
        r.register("temp-batch-abc", "srv-1", EntityKind::BATCH).await;
        r.register("temp-batch-abc", "srv-2", EntityKind::BATCH).await;
        assert_eq!(r.resolve("temp-batch-abc"), "srv-2");
        assert_eq!(r.all_mappings().len(), 1);
    }

    #[tokio::test]
    async fn mappings_for_kind_filters() {
        let mut r = resolver();
        r.register("temp-batch-1", "srv-1", EntityKind::BATCH).await;
        r.register("temp-feed-1", "srv-2", EntityKind::FEED).await;
        r.register("temp-batch-2", "srv-3", EntityKind::BATCH).await;

        let batches = r.mappings_for_kind(&EntityKind::new(EntityKind::BATCH));
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|m| m.kind.as_str() == "batch"));
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let mapping = Mapping {
            temp_id: "temp-batch-old".into(),
            canonical_id: "srv-9".into(),
            kind: EntityKind::new(EntityKind::BATCH),
            created_at_ms: 1_000,
        };
        let max_age = Duration::from_millis(500);
        // age == max_age: retained
        assert!(!is_expired(&mapping, 1_500, max_age));
        // age just past max_age: swept
        assert!(is_expired(&mapping, 1_501, max_age));
        // clock skew backwards never expires
        assert!(!is_expired(&mapping, 0, max_age));
    }
}
