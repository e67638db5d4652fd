use serde::{Deserialize, Serialize};

/// A profile row in the `users` table.
///
/// `role` stays a raw string here; the guard parses it into `Role` when it
/// needs to branch on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Input for creating a doctor account.
///
/// A present `password` provisions an auth identity before the profile row
/// is inserted; the password itself is never stored in the profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial update for a doctor profile. `None` fields are left untouched.
///
/// A supplied `password` is silently dropped: password changes are not
/// supported through this path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
