//! Medical-record operations: image upload, the AI-analysis audit entry and
//! the doctor's review.

use chrono::Utc;
use serde_json::json;

use crate::error::ServiceError;
use crate::models::{ActionType, MedicalRecord, ReviewInput, UploadFile, ValidationStatus};
use crate::store::{Filter, RemoteStore, StoreError, Table};

use super::{audit, decode, DataService};

/// Fixed diagnosis strings the review maps onto.
const AGREE_DIAGNOSIS: &str = "Agree with AI";
const DISAGREE_DIAGNOSIS: &str = "Disagree with AI";

/// Extension = substring after the last `.`; a dotless name falls back to
/// the whole name.
fn extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

impl<S: RemoteStore> DataService<S> {
    /// Upload an image and insert its record row.
    ///
    /// Storage key: `raw/{patient_id}_{epoch_millis}.{extension}`. A failed
    /// upload aborts before the insert; no row is left behind.
    pub async fn upload_medical_record(
        &self,
        patient_id: i64,
        file: UploadFile,
    ) -> Result<MedicalRecord, ServiceError> {
        let path = format!(
            "raw/{}_{}.{}",
            patient_id,
            Utc::now().timestamp_millis(),
            extension(&file.name)
        );
        let content_type = mime_guess::from_path(&file.name).first_or_octet_stream();

        self.store
            .upload(&self.bucket, &path, file.bytes, content_type.essence_str())
            .await
            .map_err(ServiceError::StorageUpload)?;

        let row = json!({
            "patient_id": patient_id,
            "original_image_path": path,
            "validation_status": ValidationStatus::Pending,
            "uploaded_at": Utc::now().to_rfc3339(),
        });
        let record: MedicalRecord = decode(self.store.insert(Table::MedicalRecords, row).await?)?;

        audit::record(
            self.store.as_ref(),
            ActionType::UploadImage,
            format!("Uploaded medical record for patient ID: {patient_id}"),
            None,
        )
        .await;
        Ok(record)
    }

    /// Record that an AI analysis ran for a patient. Audit-only: any model
    /// inference happens outside this crate, and nothing else changes.
    pub async fn log_ai_analysis(&self, patient_id: i64, result: Option<&str>) {
        let result = result.unwrap_or("Analysis Run");
        audit::record(
            self.store.as_ref(),
            ActionType::AiAnalysis,
            format!("Performed AI Analysis for patient ID: {patient_id}. Result: {result}"),
            None,
        )
        .await;
    }

    /// Store a doctor's review: notes, a Done status, and one of the two
    /// fixed diagnosis strings depending on agreement.
    pub async fn save_doctor_review(
        &self,
        record_id: i64,
        review: ReviewInput,
    ) -> Result<MedicalRecord, ServiceError> {
        let diagnosis = if review.agreement == "agree" {
            AGREE_DIAGNOSIS
        } else {
            DISAGREE_DIAGNOSIS
        };
        let changes = json!({
            "doctor_notes": review.note,
            "validation_status": ValidationStatus::Done,
            "doctor_diagnosis": diagnosis,
        });

        let mut rows = self
            .store
            .update(
                Table::MedicalRecords,
                vec![Filter::Eq("id", json!(record_id))],
                changes,
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows.into());
        }
        let record: MedicalRecord = decode(rows.swap_remove(0))?;

        audit::record(
            self.store.as_ref(),
            ActionType::DoctorReview,
            format!("Reviewed medical record ID: {record_id}"),
            None,
        )
        .await;
        Ok(record)
    }
}
