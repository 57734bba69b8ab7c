use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::TempIdLookup;
use crate::subst::{collect_temp_ids, substitute};

/// Delivery state of a queued write, as reported by the external mutation
/// queue. Only `Pending` (plus the paused flag) matters to the reconciler;
/// the remaining states exist so queue snapshots round-trip losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Pending,
    Delivering,
    Delivered,
    Failed,
}

/// Projection of one mutation-queue record. The queue owns scheduling,
/// retries and delivery; this core only rewrites `variables` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedWrite {
    pub status: WriteStatus,
    /// Set when the write was queued while offline.
    #[serde(default)]
    pub paused: bool,
    pub variables: Option<Value>,
}

impl QueuedWrite {
    fn eligible(&self) -> bool {
        self.status == WriteStatus::Pending || self.paused
    }
}

/// Scans the queue snapshot and rewrites the payload of every pending or
/// paused write for which at least one referenced placeholder has become
/// resolvable. Records without a usable payload are skipped rather than
/// failing the scan. Returns the number of rewritten writes.
///
/// Partial resolution triggers a rewrite: a write counts as updated even
/// when other placeholders in the same payload are still unresolved.
/// Deciding when a write is submittable stays with the queue engine.
pub fn reconcile_pending<L: TempIdLookup + ?Sized>(
    lookup: &L,
    writes: &mut [QueuedWrite],
) -> usize {
    let mut updated = 0;
    for write in writes.iter_mut() {
        if !write.eligible() {
            continue;
        }
        let Some(variables) = write.variables.as_ref() else {
            tracing::debug!("skipping queued write without variables");
            continue;
        };
        let referenced = collect_temp_ids(variables);
        if referenced.iter().any(|id| lookup.is_resolved(id)) {
            let rewritten = substitute(lookup, variables);
            write.variables = Some(rewritten);
            updated += 1;
        }
    }
    if updated > 0 {
        tracing::info!(updated, "rewrote queued write payloads");
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn pending(variables: Value) -> QueuedWrite {
        QueuedWrite {
            status: WriteStatus::Pending,
            paused: false,
            variables: Some(variables),
        }
    }

    #[test]
    fn rewrites_on_partial_resolution() {
        let mut lookup = HashMap::new();
        lookup.insert("temp-batch-1".to_string(), "srv-77".to_string());

        let mut writes = vec![pending(json!({
            "batchId": "temp-batch-1",
            "supplierId": "temp-supplier-9"
        }))];
        let updated = reconcile_pending(&lookup, &mut writes);

        assert_eq!(updated, 1);
        let variables = writes[0].variables.as_ref().expect("variables");
        assert_eq!(variables["batchId"], json!("srv-77"));
        assert_eq!(variables["supplierId"], json!("temp-supplier-9"));
    }

    #[test]
    fn skips_writes_without_progress() {
        let lookup: HashMap<String, String> = HashMap::new();
        let mut writes = vec![pending(json!({ "batchId": "temp-batch-1" }))];
        assert_eq!(reconcile_pending(&lookup, &mut writes), 0);
        assert_eq!(
            writes[0].variables.as_ref().expect("variables")["batchId"],
            json!("temp-batch-1")
        );
    }

    #[test]
    fn skips_delivered_and_payloadless_writes() {
        let mut lookup = HashMap::new();
        lookup.insert("temp-batch-1".to_string(), "srv-77".to_string());

        let mut writes = vec![
            QueuedWrite {
                status: WriteStatus::Delivered,
                paused: false,
                variables: Some(json!({ "batchId": "temp-batch-1" })),
            },
            QueuedWrite {
                status: WriteStatus::Pending,
                paused: false,
                variables: None,
            },
        ];
        assert_eq!(reconcile_pending(&lookup, &mut writes), 0);
        // Delivered payload stays untouched.
        assert_eq!(
            writes[0].variables.as_ref().expect("variables")["batchId"],
            json!("temp-batch-1")
        );
    }

    #[test]
    fn paused_writes_are_eligible_regardless_of_status() {
        let mut lookup = HashMap::new();
        lookup.insert("temp-batch-1".to_string(), "srv-77".to_string());

        let mut writes = vec![QueuedWrite {
            status: WriteStatus::Failed,
            paused: true,
            variables: Some(json!({ "batchId": "temp-batch-1" })),
        }];
        assert_eq!(reconcile_pending(&lookup, &mut writes), 1);
        assert_eq!(
            writes[0].variables.as_ref().expect("variables")["batchId"],
            json!("srv-77")
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&WriteStatus::Pending).expect("encode"),
            "\"pending\""
        );
    }
}
