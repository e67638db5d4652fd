use serde::{Deserialize, Serialize};

use super::MedicalRecord;

/// A row in the `patients` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Input for creating or updating a patient.
///
/// This is the exact whitelist persisted by add/update; anything else the
/// shell sends never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// List-view shape: the patient row plus fields derived from the latest
/// medical record (greatest `uploaded_at`).
#[derive(Debug, Clone, Serialize)]
pub struct PatientOverview {
    #[serde(flatten)]
    pub patient: Patient,
    /// Public URL of the latest record's image, when one exists.
    pub image: Option<String>,
    /// Latest record's validation status wire string, or `"-"` with no records.
    pub review: String,
}

/// Detail-view shape: overview fields plus the full latest record.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub image: Option<String>,
    pub review: String,
    pub latest_record: Option<MedicalRecord>,
}
