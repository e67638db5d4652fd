//! Patient CRUD and the record-derived list/detail shaping.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::models::{
    ActionType, MedicalRecord, Patient, PatientDetail, PatientInput, PatientOverview,
    ValidationStatus,
};
use crate::store::{Direction, Filter, Query, RemoteStore, StoreError, Table};

use super::{audit, decode, DataService};

/// Columns embedded for the list view; enough to derive `image` and `review`.
const OVERVIEW_RECORD_COLUMNS: &[&str] = &[
    "original_image_path",
    "validation_status",
    "doctor_diagnosis",
    "uploaded_at",
];

/// The slice of a record the list view needs.
#[derive(Debug, Deserialize)]
struct RecordGlance {
    #[serde(default)]
    original_image_path: Option<String>,
    #[serde(default)]
    validation_status: Option<ValidationStatus>,
    #[serde(default)]
    uploaded_at: Option<DateTime<Utc>>,
}

/// Pop the embedded records array off a patient row so the remainder
/// decodes as a plain `Patient`.
fn take_records(row: &mut Value) -> Value {
    row.as_object_mut()
        .and_then(|obj| obj.remove(Table::MedicalRecords.as_str()))
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

/// Latest record = greatest `uploaded_at`; records without a timestamp sort
/// oldest. On a tie the later element wins.
fn latest<T>(records: Vec<T>, uploaded_at: impl Fn(&T) -> Option<DateTime<Utc>>) -> Option<T> {
    records
        .into_iter()
        .max_by_key(|record| uploaded_at(record).map(|t| t.timestamp_millis()).unwrap_or(i64::MIN))
}

impl<S: RemoteStore> DataService<S> {
    fn derive_image(&self, path: Option<&String>) -> Option<String> {
        path.map(|p| self.store.public_url(&self.bucket, p))
    }

    fn shape_overview(&self, mut row: Value) -> Result<PatientOverview, ServiceError> {
        let records: Vec<RecordGlance> = serde_json::from_value(take_records(&mut row))
            .map_err(|e| ServiceError::RemoteQuery(StoreError::Decode(e.to_string())))?;
        let patient: Patient = decode(row)?;

        let latest = latest(records, |r| r.uploaded_at);
        let image = self.derive_image(latest.as_ref().and_then(|r| r.original_image_path.as_ref()));
        let review = latest
            .as_ref()
            .and_then(|r| r.validation_status)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        Ok(PatientOverview {
            patient,
            image,
            review,
        })
    }

    /// All patients with list-view fields derived from each one's latest
    /// medical record.
    pub async fn get_patients(&self) -> Result<Vec<PatientOverview>, ServiceError> {
        let rows = self
            .store
            .select(
                Table::Patients,
                Query::new()
                    .order("id", Direction::Asc)
                    .embed_children(Table::MedicalRecords, "patient_id", OVERVIEW_RECORD_COLUMNS),
            )
            .await?;
        rows.into_iter().map(|row| self.shape_overview(row)).collect()
    }

    /// One patient with the same derived fields plus the full latest record
    /// for the detail view.
    pub async fn get_patient_by_id(&self, id: i64) -> Result<PatientDetail, ServiceError> {
        let mut rows = self
            .store
            .select(
                Table::Patients,
                Query::new()
                    .eq("id", id)
                    .limit(1)
                    .embed_children(Table::MedicalRecords, "patient_id", &[]),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows.into());
        }
        let mut row = rows.swap_remove(0);

        let records: Vec<MedicalRecord> = serde_json::from_value(take_records(&mut row))
            .map_err(|e| ServiceError::RemoteQuery(StoreError::Decode(e.to_string())))?;
        let patient: Patient = decode(row)?;

        let latest_record = latest(records, |r| r.uploaded_at);
        let image =
            self.derive_image(latest_record.as_ref().and_then(|r| r.original_image_path.as_ref()));
        let review = latest_record
            .as_ref()
            .and_then(|r| r.validation_status)
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        Ok(PatientDetail {
            patient,
            image,
            review,
            latest_record,
        })
    }

    /// Insert a patient. Only the whitelisted fields reach the store, and
    /// adding a patient is deliberately not audited.
    pub async fn add_patient(&self, input: PatientInput) -> Result<Patient, ServiceError> {
        let row = whitelist(&input);
        decode(self.store.insert(Table::Patients, row).await?)
    }

    /// Update a patient's whitelisted fields by id.
    pub async fn update_patient(&self, id: i64, input: PatientInput) -> Result<Patient, ServiceError> {
        let mut rows = self
            .store
            .update(
                Table::Patients,
                vec![Filter::Eq("id", json!(id))],
                whitelist(&input),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows.into());
        }
        let patient: Patient = decode(rows.swap_remove(0))?;

        audit::record(
            self.store.as_ref(),
            ActionType::UpdatePatient,
            format!("Updated patient with ID: {id}"),
            None,
        )
        .await;
        Ok(patient)
    }

    /// Unconditional delete. No unlink step here: the schema cascades a
    /// patient's records, and activity logs never reference patients.
    pub async fn delete_patient(&self, id: i64) -> Result<(), ServiceError> {
        self.store
            .delete(Table::Patients, vec![Filter::Eq("id", json!(id))])
            .await?;

        audit::record(
            self.store.as_ref(),
            ActionType::DeletePatient,
            format!("Deleted patient with ID: {id}"),
            None,
        )
        .await;
        Ok(())
    }
}

/// The exact field whitelist persisted for a patient.
fn whitelist(input: &PatientInput) -> Value {
    json!({
        "name": input.name,
        "email": input.email,
        "phone": input.phone,
        "address": input.address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::service;

    fn input(name: &str) -> PatientInput {
        PatientInput {
            name: name.to_string(),
            email: Some(format!("{}@clinic.test", name.to_lowercase())),
            phone: Some("555-0100".to_string()),
            address: None,
        }
    }

    async fn seed_record(
        store: &crate::store::memory::MemoryStore,
        patient_id: i64,
        status: &str,
        path: Option<&str>,
        uploaded_at: &str,
    ) {
        store
            .insert(
                Table::MedicalRecords,
                json!({
                    "patient_id": patient_id,
                    "original_image_path": path,
                    "validation_status": status,
                    "uploaded_at": uploaded_at,
                }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn review_comes_from_latest_record_by_timestamp() {
        let (store, _, svc) = service();
        let patient = svc.add_patient(input("Ana")).await.unwrap();

        // Inserted out of chronological order on purpose: the newest
        // timestamp must win regardless of row order.
        seed_record(&store, patient.id, "Done", Some("raw/old.png"), "2026-01-02T10:00:00Z").await;
        seed_record(&store, patient.id, "PENDING", Some("raw/new.png"), "2026-03-01T10:00:00Z")
            .await;
        seed_record(&store, patient.id, "Done", None, "2026-02-01T10:00:00Z").await;

        let overviews = svc.get_patients().await.unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews[0].review, "PENDING");
        assert_eq!(
            overviews[0].image.as_deref(),
            Some("memory://breast-cancer-images/raw/new.png")
        );
    }

    #[tokio::test]
    async fn patient_without_records_shows_dash_and_no_image() {
        let (_, _, svc) = service();
        svc.add_patient(input("Ben")).await.unwrap();

        let overviews = svc.get_patients().await.unwrap();
        assert_eq!(overviews[0].review, "-");
        assert_eq!(overviews[0].image, None);
    }

    #[tokio::test]
    async fn detail_exposes_full_latest_record() {
        let (store, _, svc) = service();
        let patient = svc.add_patient(input("Ana")).await.unwrap();
        seed_record(&store, patient.id, "PENDING", Some("raw/a.png"), "2026-01-01T00:00:00Z")
            .await;
        seed_record(&store, patient.id, "Done", Some("raw/b.png"), "2026-01-05T00:00:00Z").await;

        let detail = svc.get_patient_by_id(patient.id).await.unwrap();
        assert_eq!(detail.review, "Done");
        let record = detail.latest_record.unwrap();
        assert_eq!(record.original_image_path.as_deref(), Some("raw/b.png"));
        assert_eq!(record.validation_status, Some(ValidationStatus::Done));
    }

    #[tokio::test]
    async fn missing_patient_is_remote_query_error() {
        let (_, _, svc) = service();
        let err = svc.get_patient_by_id(404).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::RemoteQuery(StoreError::NoRows)
        ));
    }

    #[tokio::test]
    async fn add_is_silent_update_is_audited() {
        let (store, _, svc) = service();
        let patient = svc.add_patient(input("Ana")).await.unwrap();
        assert!(store.rows(Table::ActivityLogs).is_empty());

        store.set_session(Some("admin@clinic.test"));
        store
            .insert(
                Table::Users,
                json!({ "name": "Root", "email": "admin@clinic.test", "role": "admin" }),
            )
            .await
            .unwrap();

        svc.update_patient(patient.id, input("Ana Maria")).await.unwrap();
        let logs = store.rows(Table::ActivityLogs);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action_type"], json!("UPDATE_PATIENT"));
    }

    #[tokio::test]
    async fn delete_patient_is_unconditional() {
        let (store, _, svc) = service();
        let patient = svc.add_patient(input("Ana")).await.unwrap();
        seed_record(&store, patient.id, "PENDING", None, "2026-01-01T00:00:00Z").await;

        svc.delete_patient(patient.id).await.unwrap();
        assert!(store.rows(Table::Patients).is_empty());
        assert!(store.rows(Table::MedicalRecords).is_empty());
    }
}
