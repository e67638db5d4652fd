use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationStatus;

/// A row in the `medical_records` table. Every record belongs to exactly
/// one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    #[serde(default)]
    pub original_image_path: Option<String>,
    #[serde(default)]
    pub validation_status: Option<ValidationStatus>,
    #[serde(default)]
    pub ai_diagnosis: Option<String>,
    #[serde(default)]
    pub doctor_diagnosis: Option<String>,
    #[serde(default)]
    pub doctor_notes: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// An in-memory file handed over by the shell for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name; its extension decides the storage key suffix
    /// and the upload content type.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A doctor's review submission for one medical record.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    /// `"agree"` maps to the fixed diagnosis string "Agree with AI";
    /// anything else maps to "Disagree with AI".
    pub agreement: String,
    pub note: String,
}
