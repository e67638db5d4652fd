//! Doctor account management.

use serde_json::{json, Map, Value};

use crate::error::ServiceError;
use crate::models::{ActionType, DoctorUpdate, NewDoctor, Role, User};
use crate::store::{Direction, Filter, Query, RemoteStore, StoreError, Table};

use super::{audit, decode, decode_rows, DataService};

impl<S: RemoteStore> DataService<S> {
    /// All doctor profiles, ascending by id.
    pub async fn get_doctors(&self) -> Result<Vec<User>, ServiceError> {
        let rows = self
            .store
            .select(
                Table::Users,
                Query::new()
                    .eq("role", Role::Doctor.as_str())
                    .order("id", Direction::Asc),
            )
            .await?;
        decode_rows(rows)
    }

    /// Create a doctor: optionally provision an auth identity, then insert
    /// the profile row.
    ///
    /// Provisioning goes through `sign_up`, which never touches the current
    /// session: creating an account for a new doctor keeps the admin signed
    /// in as themselves. If provisioning fails, no profile row is inserted.
    pub async fn add_doctor(&self, doctor: NewDoctor) -> Result<User, ServiceError> {
        if let Some(password) = &doctor.password {
            let metadata = json!({
                "name": doctor.name,
                "role": Role::Doctor.as_str(),
                "status": doctor.status.clone().unwrap_or_else(|| "Active".to_string()),
            });
            self.store
                .sign_up(&doctor.email, password, metadata)
                .await
                .map_err(|e| ServiceError::AuthProvisioning(e.to_string()))?;
        }

        let row = json!({
            "name": doctor.name,
            "email": doctor.email,
            "status": doctor.status,
            "role": Role::Doctor.as_str(),
        });
        let user: User = decode(self.store.insert(Table::Users, row).await?)?;

        // Attributed to the freshly inserted row, not the calling admin.
        audit::record(
            self.store.as_ref(),
            ActionType::AddDoctor,
            format!("Added new doctor: {}", user.name),
            Some(user.id),
        )
        .await;
        Ok(user)
    }

    /// Update a doctor profile by id. A supplied password is silently
    /// dropped: password changes are not supported through this path.
    pub async fn update_doctor(&self, id: i64, updates: DoctorUpdate) -> Result<User, ServiceError> {
        let mut changes = Map::new();
        if let Some(name) = updates.name {
            changes.insert("name".to_string(), json!(name));
        }
        if let Some(email) = updates.email {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(status) = updates.status {
            changes.insert("status".to_string(), json!(status));
        }

        let mut rows = self
            .store
            .update(
                Table::Users,
                vec![Filter::Eq("id", json!(id))],
                Value::Object(changes),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows.into());
        }
        let user: User = decode(rows.swap_remove(0))?;

        audit::record(
            self.store.as_ref(),
            ActionType::UpdateDoctor,
            format!("Updated doctor with ID: {id}"),
            None,
        )
        .await;
        Ok(user)
    }

    /// Delete a doctor. Two steps, order required by the schema's
    /// referential restriction: first null out `user_id` on every activity
    /// log referencing the doctor, then delete the profile row. A failed
    /// unlink aborts the delete.
    pub async fn delete_doctor(&self, id: i64) -> Result<(), ServiceError> {
        self.store
            .update(
                Table::ActivityLogs,
                vec![Filter::Eq("user_id", json!(id))],
                json!({ "user_id": null }),
            )
            .await
            .map_err(ServiceError::Unlink)?;

        self.store
            .delete(Table::Users, vec![Filter::Eq("id", json!(id))])
            .await?;

        audit::record(
            self.store.as_ref(),
            ActionType::DeleteDoctor,
            format!("Deleted doctor with ID: {id}"),
            None,
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::service;

    fn new_doctor(password: Option<&str>) -> NewDoctor {
        NewDoctor {
            name: "Dr. Sari".to_string(),
            email: "sari@clinic.test".to_string(),
            status: None,
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn get_doctors_filters_by_role_ascending() {
        let (store, _, svc) = service();
        for (name, role) in [("Zed", "doctor"), ("Amy", "admin"), ("Bea", "doctor")] {
            store
                .insert(
                    Table::Users,
                    json!({ "name": name, "email": format!("{name}@c.test"), "role": role }),
                )
                .await
                .unwrap();
        }

        let doctors = svc.get_doctors().await.unwrap();
        assert_eq!(doctors.len(), 2);
        assert!(doctors[0].id < doctors[1].id);
        assert!(doctors.iter().all(|d| d.role == "doctor"));
    }

    #[tokio::test]
    async fn add_doctor_inserts_profile_without_password() {
        let (store, _, svc) = service();
        let user = svc.add_doctor(new_doctor(Some("hunter2"))).await.unwrap();

        assert_eq!(user.role, "doctor");
        assert_eq!(store.password_of("sari@clinic.test").unwrap(), "hunter2");
        assert!(store.session().is_none(), "provisioning must not sign anyone in");

        let rows = store.rows(Table::Users);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("password").is_none());

        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["user_id"], json!(user.id));
        assert_eq!(logs[0]["description"], json!("Added new doctor: Dr. Sari"));
    }

    #[tokio::test]
    async fn add_doctor_without_password_skips_provisioning() {
        let (store, _, svc) = service();
        svc.add_doctor(new_doctor(None)).await.unwrap();
        assert!(store.password_of("sari@clinic.test").is_none());
        assert_eq!(store.rows(Table::Users).len(), 1);
    }

    #[tokio::test]
    async fn failed_provisioning_inserts_no_profile_row() {
        let (store, _, svc) = service();
        store.fail_signup();

        let err = svc.add_doctor(new_doctor(Some("pw"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::AuthProvisioning(_)));
        assert!(store.rows(Table::Users).is_empty());
        assert!(store.rows(Table::ActivityLogs).is_empty());
    }

    #[tokio::test]
    async fn update_doctor_strips_password_and_logs() {
        let (store, _, svc) = service();
        let user = svc.add_doctor(new_doctor(None)).await.unwrap();
        store.set_session(Some("sari@clinic.test"));

        let updated = svc
            .update_doctor(
                user.id,
                DoctorUpdate {
                    name: Some("Dr. Sari Putri".to_string()),
                    password: Some("should-be-ignored".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Dr. Sari Putri");
        assert_eq!(updated.email, "sari@clinic.test");
        let rows = store.rows(Table::Users);
        assert!(rows[0].get("password").is_none());

        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(
            logs.last().unwrap()["description"],
            json!(format!("Updated doctor with ID: {}", user.id))
        );
    }

    #[tokio::test]
    async fn update_doctor_missing_id_is_remote_query_error() {
        let (_, _, svc) = service();
        let err = svc
            .update_doctor(404, DoctorUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::RemoteQuery(StoreError::NoRows)
        ));
    }

    #[tokio::test]
    async fn delete_doctor_unlinks_logs_first() {
        let (store, _, svc) = service();
        let user = svc.add_doctor(new_doctor(None)).await.unwrap();
        // add_doctor left a log row referencing the doctor; a bare delete
        // would hit the referential restriction.
        assert_eq!(store.rows(Table::ActivityLogs).len(), 1);

        svc.delete_doctor(user.id).await.unwrap();

        assert!(store.rows(Table::Users).is_empty());
        for log in store.rows(Table::ActivityLogs) {
            assert!(log["user_id"].is_null());
        }
    }

    #[tokio::test]
    async fn failed_unlink_aborts_the_delete() {
        let (store, _, svc) = service();
        let user = svc.add_doctor(new_doctor(None)).await.unwrap();
        store.fail_table(Table::ActivityLogs);

        let err = svc.delete_doctor(user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unlink(_)));
        assert_eq!(store.rows(Table::Users).len(), 1, "user row must survive");
    }
}
