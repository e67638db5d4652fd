//! In-memory `RemoteStore` for tests: JSON rows in per-table vectors with
//! serial ids and column defaults, the hosted schema's referential behavior
//! (a still-referenced user cannot be deleted; deleting a patient cascades
//! to their records), a toy auth provider, and failure-injection switches.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde_json::{json, Map, Value};

use super::{AuthSession, Direction, Embed, Filter, Query, RemoteStore, StoreError, Table};

#[derive(Default)]
struct Inner {
    rows: HashMap<Table, Vec<Value>>,
    next_id: HashMap<Table, i64>,
    /// email -> password
    accounts: HashMap<String, String>,
    session_email: Option<String>,
    /// "bucket/path" -> (bytes, content type)
    uploads: HashMap<String, (Vec<u8>, String)>,
    failing_tables: HashSet<Table>,
    fail_uploads: bool,
    fail_signup: bool,
}

/// In-memory store. Cheap to construct per test; all state behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Failure injection ──────────────────────────────────

    /// Make every table operation on `table` fail with HTTP 500.
    pub fn fail_table(&self, table: Table) {
        self.lock().failing_tables.insert(table);
    }

    /// Make every storage upload fail.
    pub fn fail_uploads(&self) {
        self.lock().fail_uploads = true;
    }

    /// Make auth provisioning fail.
    pub fn fail_signup(&self) {
        self.lock().fail_signup = true;
    }

    // ── Test inspection helpers ────────────────────────────

    /// Snapshot of a table's rows, insertion order.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.lock().rows.get(&table).cloned().unwrap_or_default()
    }

    /// Register an auth account without going through `sign_up`.
    pub fn add_account(&self, email: &str, password: &str) {
        self.lock()
            .accounts
            .insert(email.to_string(), password.to_string());
    }

    /// Force the auth session, as if a login flow already ran.
    pub fn set_session(&self, email: Option<&str>) {
        self.lock().session_email = email.map(str::to_string);
    }

    /// Stored password for an account.
    pub fn password_of(&self, email: &str) -> Option<String> {
        self.lock().accounts.get(email).cloned()
    }

    /// Paths of every uploaded object, as "bucket/path".
    pub fn uploaded_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.lock().uploads.keys().cloned().collect();
        paths.sort();
        paths
    }
}

// ═══════════════════════════════════════════════════════════
// Row predicates and shaping
// ═══════════════════════════════════════════════════════════

fn column<'a>(row: &'a Value, name: &str) -> &'a Value {
    row.get(name).unwrap_or(&Value::Null)
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(col, value) => column(row, col) == value,
        Filter::NotNull(col) => !column(row, col).is_null(),
    })
}

/// Column ordering: null sorts lowest, numbers numerically, strings
/// lexicographically (RFC 3339 timestamps order correctly this way).
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Project a row onto a column list; an empty list keeps all columns.
fn project(row: &Value, columns: &[&str]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let mut out = Map::new();
    for col in columns {
        out.insert((*col).to_string(), column(row, col).clone());
    }
    Value::Object(out)
}

impl Inner {
    fn check_available(&self, table: Table) -> Result<(), StoreError> {
        if self.failing_tables.contains(&table) {
            return Err(StoreError::Http {
                status: 500,
                body: format!("simulated failure on {}", table.as_str()),
            });
        }
        Ok(())
    }

    fn table(&self, table: Table) -> &[Value] {
        self.rows.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn attach_embed(&self, row: &mut Value, embed: &Embed) {
        match embed {
            Embed::Children {
                table,
                foreign_key,
                columns,
            } => {
                let id = column(row, "id").clone();
                let children: Vec<Value> = self
                    .table(*table)
                    .iter()
                    .filter(|child| column(child, foreign_key) == &id)
                    .map(|child| project(child, columns))
                    .collect();
                row[table.as_str()] = Value::Array(children);
            }
            Embed::Parent {
                table,
                foreign_key,
                columns,
            } => {
                let fk = column(row, foreign_key).clone();
                let parent = if fk.is_null() {
                    Value::Null
                } else {
                    self.table(*table)
                        .iter()
                        .find(|candidate| column(candidate, "id") == &fk)
                        .map(|candidate| project(candidate, columns))
                        .unwrap_or(Value::Null)
                };
                row[table.as_str()] = parent;
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// RemoteStore implementation
// ═══════════════════════════════════════════════════════════

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, StoreError> {
        let inner = self.lock();
        inner.check_available(table)?;

        let mut rows: Vec<Value> = inner
            .table(table)
            .iter()
            .filter(|row| matches(row, &query.filters))
            .cloned()
            .collect();

        if let Some((col, direction)) = query.order {
            rows.sort_by(|a, b| {
                let ord = cmp_values(column(a, col), column(b, col));
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(n) = query.limit {
            rows.truncate(n);
        }
        if let Some(embed) = &query.embed {
            for row in &mut rows {
                inner.attach_embed(row, embed);
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value, StoreError> {
        let mut inner = self.lock();
        inner.check_available(table)?;

        if !row.is_object() {
            return Err(StoreError::Decode(format!(
                "insert row must be an object, got {row}"
            )));
        }
        let id = {
            let next = inner.next_id.entry(table).or_insert(1);
            let id = *next;
            *next += 1;
            id
        };
        row["id"] = json!(id);
        if table == Table::ActivityLogs && column(&row, "timestamp").is_null() {
            row["timestamp"] = json!(Utc::now().to_rfc3339());
        }
        inner.rows.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        filters: Vec<Filter>,
        changes: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.lock();
        inner.check_available(table)?;

        let changes = match changes {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Decode(format!(
                    "update changes must be an object, got {other}"
                )))
            }
        };

        let mut updated = Vec::new();
        for row in inner.rows.entry(table).or_default().iter_mut() {
            if matches(row, &filters) {
                for (key, value) in &changes {
                    row[key.as_str()] = value.clone();
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: Vec<Filter>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_available(table)?;

        let doomed_ids: Vec<Value> = inner
            .table(table)
            .iter()
            .filter(|row| matches(row, &filters))
            .map(|row| column(row, "id").clone())
            .collect();

        // The hosted schema restricts deleting users still referenced by
        // activity logs.
        if table == Table::Users {
            let referenced = inner.table(Table::ActivityLogs).iter().any(|log| {
                let user_id = column(log, "user_id");
                !user_id.is_null() && doomed_ids.contains(user_id)
            });
            if referenced {
                return Err(StoreError::Http {
                    status: 409,
                    body: "update or delete on table \"users\" violates foreign key \
                           constraint on \"activity_logs\""
                        .to_string(),
                });
            }
        }

        // Patients cascade to their medical records.
        if table == Table::Patients {
            inner
                .rows
                .entry(Table::MedicalRecords)
                .or_default()
                .retain(|record| !doomed_ids.contains(column(record, "patient_id")));
        }

        inner
            .rows
            .entry(table)
            .or_default()
            .retain(|row| !matches(row, &filters));
        Ok(())
    }

    async fn count(&self, table: Table, filters: Vec<Filter>) -> Result<u64, StoreError> {
        let inner = self.lock();
        inner.check_available(table)?;
        Ok(inner
            .table(table)
            .iter()
            .filter(|row| matches(row, &filters))
            .count() as u64)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_uploads {
            return Err(StoreError::Http {
                status: 500,
                body: "simulated upload failure".to_string(),
            });
        }
        inner
            .uploads
            .insert(format!("{bucket}/{path}"), (bytes, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _metadata: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_signup {
            return Err(StoreError::Http {
                status: 422,
                body: "User already registered".to_string(),
            });
        }
        inner
            .accounts
            .insert(email.to_string(), password.to_string());
        // The current session is untouched on purpose.
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner.accounts.get(email) {
            Some(stored) if stored == password => {
                inner.session_email = Some(email.to_string());
                Ok(())
            }
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    fn session(&self) -> Option<AuthSession> {
        self.lock()
            .session_email
            .as_ref()
            .map(|email| AuthSession {
                email: email.clone(),
            })
    }

    async fn update_password(&self, new_password: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let email = inner.session_email.clone().ok_or(StoreError::NoSession)?;
        inner.accounts.insert(email, new_password.to_string());
        Ok(())
    }
}
