//! Temp-ID lifecycle and dependency-resolution engine for records created
//! offline.
//!
//! A record authored while disconnected carries a client-minted placeholder
//! identifier (`temp-<kind>-<suffix>`). Dependent records queued in the same
//! session reference that placeholder before either has synced. Once the
//! owning record delivers and the backend assigns a canonical ID, the
//! [`resolver`] learns the mapping, the [`reconcile`] pass rewrites queued
//! payloads via the [`subst`] walker, and writes stuck on a dependency that
//! has not resolved are surfaced through the [`blocked`] tracker.

pub mod blocked;
pub mod engine;
pub mod reconcile;
pub mod resolver;
pub mod subst;
pub mod temp_id;
mod util;

pub use blocked::{BlockedWrite, BlockedWriteTracker, ListenerId};
pub use engine::{SyncConfig, SyncEngine};
pub use reconcile::{QueuedWrite, WriteStatus, reconcile_pending};
pub use resolver::{DEFAULT_MAPPING_RETENTION, Mapping, TempIdLookup, TempIdResolver};
pub use subst::{collect_temp_ids, find_unresolved_ids, substitute};
pub use temp_id::{EntityKind, TEMP_ID_PREFIX, entity_kind_of, is_temp_id};
