use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row in the `activity_logs` audit table.
///
/// `user_id` is nullable: deleting a doctor nulls it out on their log rows
/// before the profile row goes, so the audit trail outlives the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub action_type: String,
    pub description: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Display shape for the recent-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    /// The raw action tag, e.g. `UPLOAD_IMAGE`.
    pub title: String,
    /// Acting user's name, `"Unknown"` when the reference is null or gone.
    pub user: String,
    /// Wall-clock time of day, `%H:%M:%S`.
    pub time: String,
    pub icon_color: &'static str,
}

/// One dashboard tile.
#[derive(Debug, Clone, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u64,
    pub icon: &'static str,
    pub color: &'static str,
}
