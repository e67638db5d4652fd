//! Post-commit audit hook.
//!
//! Every mutating facade method awaits `record` before returning. The hook
//! never fails its caller: if no acting user id can be resolved the write is
//! skipped entirely, and any failure in the lookup or the insert is logged
//! and swallowed.

use serde_json::json;

use crate::models::ActionType;
use crate::store::{Query, RemoteStore, Table};

/// Append one activity row for `action`.
///
/// An explicit `user_id` wins; otherwise the actor is resolved from the
/// current auth session's email via a profile lookup.
pub(crate) async fn record<S: RemoteStore>(
    store: &S,
    action: ActionType,
    description: String,
    user_id: Option<i64>,
) {
    let actor = match user_id {
        Some(id) => id,
        None => match resolve_actor(store).await {
            Some(id) => id,
            None => {
                tracing::debug!(
                    action = action.as_str(),
                    "No acting user resolvable, skipping activity log"
                );
                return;
            }
        },
    };

    let row = json!({
        "user_id": actor,
        "action_type": action.as_str(),
        "description": description,
    });
    if let Err(e) = store.insert(Table::ActivityLogs, row).await {
        tracing::warn!(error = %e, action = action.as_str(), "Activity log write failed");
    }
}

/// Profile id of the signed-in identity, or `None` (failures included).
async fn resolve_actor<S: RemoteStore>(store: &S) -> Option<i64> {
    let session = store.session()?;
    let rows = match store
        .select(
            Table::Users,
            Query::new().eq("email", session.email.as_str()).limit(1),
        )
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "Actor lookup failed, skipping activity log");
            return None;
        }
    };
    rows.first().and_then(|row| row.get("id")).and_then(|id| id.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::Value;

    #[tokio::test]
    async fn explicit_actor_wins_over_session() {
        let store = MemoryStore::new();
        record(&store, ActionType::AddDoctor, "Added new doctor: X".into(), Some(9)).await;

        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["user_id"], Value::from(9));
        assert_eq!(logs[0]["action_type"], Value::from("ADD_DOCTOR"));
    }

    #[tokio::test]
    async fn session_actor_resolved_through_profile_row() {
        let store = MemoryStore::new();
        let user = store
            .insert(
                Table::Users,
                serde_json::json!({ "name": "Dr", "email": "dr@clinic.test", "role": "doctor" }),
            )
            .await
            .unwrap();
        store.set_session(Some("dr@clinic.test"));

        record(&store, ActionType::UpdatePatient, "Updated patient with ID: 1".into(), None).await;

        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["user_id"], user["id"]);
    }

    #[tokio::test]
    async fn no_resolvable_actor_skips_the_write() {
        let store = MemoryStore::new();
        record(&store, ActionType::DeletePatient, "Deleted patient with ID: 1".into(), None).await;
        assert!(store.rows(Table::ActivityLogs).is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_swallowed() {
        let store = MemoryStore::new();
        store.fail_table(Table::ActivityLogs);
        // Must not panic or propagate.
        record(&store, ActionType::DoctorReview, "Reviewed medical record ID: 1".into(), Some(1))
            .await;
        assert!(store.rows(Table::ActivityLogs).is_empty());
    }
}
