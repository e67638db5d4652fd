//! The remote-store boundary: the hosted backend's tables, object storage
//! and auth provider behind one async trait.
//!
//! The facade is written against `RemoteStore` only. Production wires in
//! `rest::RestStore`; tests drive `memory::MemoryStore`, which reproduces the
//! hosted schema's referential behavior.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

// ═══════════════════════════════════════════════════════════
// Tables and queries
// ═══════════════════════════════════════════════════════════

/// The relational tables this application touches. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Patients,
    MedicalRecords,
    ActivityLogs,
}

impl Table {
    /// Wire name of the table, also the key embedded rows nest under.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Patients => "patients",
            Self::MedicalRecords => "medical_records",
            Self::ActivityLogs => "activity_logs",
        }
    }
}

/// A single row filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the given JSON value.
    Eq(&'static str, Value),
    /// Column is not null.
    NotNull(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A joined selection nested into each returned row under the related
/// table's wire name.
#[derive(Debug, Clone)]
pub enum Embed {
    /// Child rows whose `foreign_key` references this row's id, nested as an
    /// array. An empty `columns` slice selects all columns.
    Children {
        table: Table,
        foreign_key: &'static str,
        columns: &'static [&'static str],
    },
    /// The parent row referenced by this row's `foreign_key`, nested as an
    /// object or null.
    Parent {
        table: Table,
        foreign_key: &'static str,
        columns: &'static [&'static str],
    },
}

/// A select query: filters, optional order, optional limit, optional embed.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<(&'static str, Direction)>,
    pub limit: Option<usize>,
    pub embed: Option<Embed>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn not_null(mut self, column: &'static str) -> Self {
        self.filters.push(Filter::NotNull(column));
        self
    }

    pub fn order(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some((column, direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn embed_children(
        mut self,
        table: Table,
        foreign_key: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        self.embed = Some(Embed::Children {
            table,
            foreign_key,
            columns,
        });
        self
    }

    pub fn embed_parent(
        mut self,
        table: Table,
        foreign_key: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        self.embed = Some(Embed::Parent {
            table,
            foreign_key,
            columns,
        });
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Errors and sessions
// ═══════════════════════════════════════════════════════════

/// Errors crossing the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to decode backend response: {0}")]
    Decode(String),
    #[error("No rows matched")]
    NoRows,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("No auth session")]
    NoSession,
}

/// The locally held auth session. Reading it is never a network call.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub email: String,
}

// ═══════════════════════════════════════════════════════════
// RemoteStore trait
// ═══════════════════════════════════════════════════════════

/// The hosted backend as used by the facade: relational tables, one storage
/// bucket and the auth provider. All remote operations are suspension
/// points; none carries a timeout or is retried.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Run a select query, returning raw JSON rows.
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, StoreError>;

    /// Insert one row, returning its stored representation (serial id and
    /// column defaults applied).
    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError>;

    /// Update matching rows with the given changes, returning the updated rows.
    async fn update(
        &self,
        table: Table,
        filters: Vec<Filter>,
        changes: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Delete matching rows.
    async fn delete(&self, table: Table, filters: Vec<Filter>) -> Result<(), StoreError>;

    /// Count matching rows without fetching them.
    async fn count(&self, table: Table, filters: Vec<Filter>) -> Result<u64, StoreError>;

    /// Upload an object into a bucket.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    /// Public URL for an object. Pure string construction.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Provision a new auth identity. Must never replace the current
    /// session: creating an account for someone else keeps the caller
    /// signed in as themselves.
    async fn sign_up(&self, email: &str, password: &str, metadata: Value)
        -> Result<(), StoreError>;

    /// Verify credentials and replace the current session on success.
    /// Wrong credentials yield `StoreError::InvalidCredentials`.
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError>;

    /// The locally held session, if signed in.
    fn session(&self) -> Option<AuthSession>;

    /// Change the current session's password. `StoreError::NoSession`
    /// when not signed in.
    async fn update_password(&self, new_password: &str) -> Result<(), StoreError>;
}
