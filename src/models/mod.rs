//! Typed surfaces over the remote store's JSON rows: row models, input
//! whitelists, display records and the closed string enums they share.

mod activity;
mod enums;
mod patient;
mod record;
mod user;

pub use activity::{ActivityEntry, ActivityLog, StatCard};
pub use enums::{ActionType, InvalidEnum, Role, ValidationStatus};
pub use patient::{Patient, PatientDetail, PatientInput, PatientOverview};
pub use record::{MedicalRecord, ReviewInput, UploadFile};
pub use user::{DoctorUpdate, NewDoctor, User};
