//! Dashboard read-outs: the four stat tiles and the recent-activity feed.

use serde_json::{json, Value};

use crate::error::ServiceError;
use crate::models::{ActivityEntry, ActivityLog, Role, StatCard};
use crate::store::{Direction, Filter, Query, RemoteStore, Table};

use super::{decode, DataService};

/// Fixed display tag for every activity row.
const ACTIVITY_ICON_COLOR: &str = "bg-blue-100 text-blue-600";

impl<S: RemoteStore> DataService<S> {
    /// The latest 10 audit rows, newest first, with the acting user's name
    /// resolved (`"Unknown"` when the reference is null or gone).
    pub async fn get_activities(&self) -> Result<Vec<ActivityEntry>, ServiceError> {
        let rows = self
            .store
            .select(
                Table::ActivityLogs,
                Query::new()
                    .order("timestamp", Direction::Desc)
                    .limit(10)
                    .embed_parent(Table::Users, "user_id", &["name"]),
            )
            .await?;
        rows.into_iter().map(shape_activity).collect()
    }

    /// The four dashboard tiles, fixed order, each count isolated: one
    /// failing query is logged and shows as 0 instead of failing the rest.
    pub async fn get_dashboard_stats(&self) -> [StatCard; 4] {
        let (patients, doctors, images, waiting) = tokio::join!(
            self.count_or_zero(Table::Patients, vec![], "patients"),
            self.count_or_zero(
                Table::Users,
                vec![Filter::Eq("role", json!(Role::Doctor.as_str()))],
                "doctors",
            ),
            self.count_or_zero(
                Table::MedicalRecords,
                vec![Filter::NotNull("original_image_path")],
                "uploaded images",
            ),
            self.count_or_zero(
                Table::MedicalRecords,
                vec![Filter::Eq("validation_status", json!("PENDING"))],
                "pending reviews",
            ),
        );

        [
            StatCard {
                label: "Total Patient",
                value: patients,
                icon: "users",
                color: "blue",
            },
            StatCard {
                label: "Total Doctor",
                value: doctors,
                icon: "user-md",
                color: "green",
            },
            StatCard {
                label: "Image Uploaded",
                value: images,
                icon: "image",
                color: "blue",
            },
            StatCard {
                label: "Waiting For Review",
                value: waiting,
                icon: "clock",
                color: "red",
            },
        ]
    }

    async fn count_or_zero(&self, table: Table, filters: Vec<Filter>, what: &str) -> u64 {
        match self.store.count(table, filters).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, what, "Dashboard count failed, defaulting to 0");
                0
            }
        }
    }
}

fn shape_activity(row: Value) -> Result<ActivityEntry, ServiceError> {
    let user = row[Table::Users.as_str()]["name"]
        .as_str()
        .unwrap_or("Unknown")
        .to_string();
    let log: ActivityLog = decode(row)?;
    let time = log
        .timestamp
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    Ok(ActivityEntry {
        id: log.id,
        title: log.action_type,
        user,
        time,
        icon_color: ACTIVITY_ICON_COLOR,
    })
}
