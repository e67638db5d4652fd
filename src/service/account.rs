//! The signed-in account: password change, identity lookup, and the
//! session-context refresh hook.

use crate::error::ServiceError;
use crate::models::{ActionType, User};
use crate::session::Session;
use crate::store::{Query, RemoteStore, StoreError, Table};

use super::{audit, DataService};

impl<S: RemoteStore> DataService<S> {
    /// Change the session's password. The current password is verified by
    /// re-authenticating first; a failed verification leaves the stored
    /// password untouched.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ServiceError> {
        let session = self.store.session().ok_or(ServiceError::NotAuthenticated)?;

        match self.store.sign_in(&session.email, current).await {
            Ok(()) => {}
            Err(StoreError::InvalidCredentials) => return Err(ServiceError::IncorrectPassword),
            Err(e) => return Err(e.into()),
        }
        self.store.update_password(new).await?;

        audit::record(
            self.store.as_ref(),
            ActionType::ChangePassword,
            "Changed account password".to_string(),
            None,
        )
        .await;
        Ok(())
    }

    /// Profile row matching the auth session's email. `None` when signed
    /// out or on any lookup failure; failures are logged, never thrown.
    pub async fn get_current_user(&self) -> Option<User> {
        let session = self.store.session()?;

        let mut rows = match self
            .store
            .select(
                Table::Users,
                Query::new().eq("email", session.email.as_str()).limit(1),
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "Current-user lookup failed");
                return None;
            }
        };
        if rows.is_empty() {
            tracing::warn!(email = %session.email, "No profile row for session identity");
            return None;
        }
        match serde_json::from_value(rows.swap_remove(0)) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Current-user row failed to decode");
                None
            }
        }
    }

    /// Refresh the shared session context from the auth state. The shell
    /// calls this after login and logout.
    pub async fn refresh_session(&self) {
        match self.get_current_user().await {
            Some(user) => self.session.set(Session {
                user_id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
            }),
            None => self.session.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::service;
    use serde_json::json;

    async fn signed_in_doctor(
        store: &crate::store::memory::MemoryStore,
    ) -> i64 {
        let user = store
            .insert(
                Table::Users,
                json!({ "name": "Dr. Sari", "email": "sari@clinic.test", "role": "doctor" }),
            )
            .await
            .unwrap();
        store.add_account("sari@clinic.test", "old-password");
        store.set_session(Some("sari@clinic.test"));
        user["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn change_password_requires_session() {
        let (_, _, svc) = service();
        let err = svc.change_password("a", "b").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotAuthenticated));
    }

    #[tokio::test]
    async fn wrong_current_password_changes_nothing() {
        let (store, _, svc) = service();
        signed_in_doctor(&store).await;

        let err = svc.change_password("wrong", "new").await.unwrap_err();
        assert!(matches!(err, ServiceError::IncorrectPassword));
        assert_eq!(store.password_of("sari@clinic.test").unwrap(), "old-password");
        assert!(store.rows(Table::ActivityLogs).is_empty());
    }

    #[tokio::test]
    async fn correct_password_rotates_and_logs() {
        let (store, _, svc) = service();
        let user_id = signed_in_doctor(&store).await;

        svc.change_password("old-password", "new-password").await.unwrap();
        assert_eq!(store.password_of("sari@clinic.test").unwrap(), "new-password");

        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action_type"], json!("CHANGE_PASSWORD"));
        assert_eq!(logs[0]["user_id"], json!(user_id));
    }

    #[tokio::test]
    async fn current_user_is_none_without_session() {
        let (_, _, svc) = service();
        assert!(svc.get_current_user().await.is_none());
    }

    #[tokio::test]
    async fn current_user_is_none_on_lookup_failure() {
        let (store, _, svc) = service();
        signed_in_doctor(&store).await;
        store.fail_table(Table::Users);
        assert!(svc.get_current_user().await.is_none());
    }

    #[tokio::test]
    async fn refresh_session_mirrors_auth_state() {
        let (store, session, svc) = service();
        let user_id = signed_in_doctor(&store).await;

        svc.refresh_session().await;
        let current = session.current().unwrap();
        assert_eq!(current.user_id, user_id);
        assert_eq!(current.role, "doctor");

        store.set_session(None);
        svc.refresh_session().await;
        assert!(session.current().is_none());
    }
}
