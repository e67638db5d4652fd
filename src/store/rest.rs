//! Production `RemoteStore` over the hosted backend's REST surface:
//! PostgREST-style table endpoints, a storage object API and a
//! password-grant auth provider, all through one `reqwest` client.

use std::sync::RwLock;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::RemoteConfig;

use super::{AuthSession, Direction, Embed, Filter, Query, RemoteStore, StoreError, Table};

/// Access token plus the identity it belongs to, held after a sign-in.
#[derive(Debug, Clone)]
struct RestSession {
    access_token: String,
    email: String,
}

/// REST client for the hosted backend.
pub struct RestStore {
    base: String,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<RestSession>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    email: String,
}

impl RestStore {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            base: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            client: reqwest::Client::new(),
            session: RwLock::new(None),
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base, table.as_str())
    }

    /// Bearer token for table/storage requests: the session access token
    /// when signed in, the anon key otherwise.
    fn bearer(&self) -> String {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    fn store_session(&self, session: Option<RestSession>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Wire shaping (pure, unit-tested)
// ═══════════════════════════════════════════════════════════

/// Render a filter value the way the table endpoints expect it
/// (strings unquoted, numbers bare).
fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_pair(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(column, value) => ((*column).to_string(), format!("eq.{}", filter_literal(value))),
        Filter::NotNull(column) => ((*column).to_string(), "not.is.null".to_string()),
    }
}

fn embed_selection(embed: &Embed) -> String {
    let (table, columns) = match embed {
        Embed::Children { table, columns, .. } => (table, columns),
        Embed::Parent { table, columns, .. } => (table, columns),
    };
    let cols = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    };
    format!("{}({})", table.as_str(), cols)
}

/// Render a query into URL key/value pairs, `select` first.
fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let select = match &query.embed {
        Some(embed) => format!("*,{}", embed_selection(embed)),
        None => "*".to_string(),
    };

    let mut pairs = vec![("select".to_string(), select)];
    for filter in &query.filters {
        pairs.push(filter_pair(filter));
    }
    if let Some((column, direction)) = query.order {
        let dir = match direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        pairs.push(("order".to_string(), format!("{column}.{dir}")));
    }
    if let Some(n) = query.limit {
        pairs.push(("limit".to_string(), n.to_string()));
    }
    pairs
}

/// Total from a `Content-Range` header, e.g. `0-9/42` or `*/0`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.parse().ok()
}

fn map_reqwest(e: reqwest::Error) -> StoreError {
    if e.is_connect() {
        StoreError::Transport(format!("Connection failed: {e}"))
    } else if e.is_timeout() {
        StoreError::Transport(format!("Request timed out: {e}"))
    } else {
        StoreError::Transport(e.to_string())
    }
}

/// Pass through 2xx responses, turn everything else into `Http`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        body,
    })
}

async fn decode_rows(response: reqwest::Response) -> Result<Vec<Value>, StoreError> {
    response
        .json()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

// ═══════════════════════════════════════════════════════════
// RemoteStore implementation
// ═══════════════════════════════════════════════════════════

#[async_trait::async_trait]
impl RemoteStore for RestStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&query_pairs(&query))
            .send()
            .await
            .map_err(map_reqwest)?;
        decode_rows(check_status(response).await?).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(map_reqwest)?;
        let mut rows = decode_rows(check_status(response).await?).await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows);
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(
        &self,
        table: Table,
        filters: Vec<Filter>,
        changes: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let pairs: Vec<_> = filters.iter().map(filter_pair).collect();
        let response = self
            .authed(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&pairs)
            .json(&changes)
            .send()
            .await
            .map_err(map_reqwest)?;
        decode_rows(check_status(response).await?).await
    }

    async fn delete(&self, table: Table, filters: Vec<Filter>) -> Result<(), StoreError> {
        let pairs: Vec<_> = filters.iter().map(filter_pair).collect();
        let response = self
            .authed(self.client.delete(self.table_url(table)))
            .query(&pairs)
            .send()
            .await
            .map_err(map_reqwest)?;
        check_status(response).await?;
        Ok(())
    }

    async fn count(&self, table: Table, filters: Vec<Filter>) -> Result<u64, StoreError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(filters.iter().map(filter_pair));
        let response = self
            .authed(self.client.head(self.table_url(table)))
            .header("Prefer", "count=exact")
            .query(&pairs)
            .send()
            .await
            .map_err(map_reqwest)?;
        let response = check_status(response).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Decode("Missing Content-Range count".to_string()))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base, bucket, path);
        let response = self
            .authed(self.client.post(url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(map_reqwest)?;
        check_status(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base, bucket, path)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<(), StoreError> {
        let url = format!("{}/auth/v1/signup", self.base);
        // Anon-key credentials on purpose: provisioning someone else's
        // account must not ride on (or replace) the caller's session.
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .json(&json!({ "email": email, "password": password, "data": metadata }))
            .send()
            .await
            .map_err(map_reqwest)?;
        // Any session in the response body is discarded.
        check_status(response).await?;
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base);
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if status.as_u16() == 400 {
            return Err(StoreError::InvalidCredentials);
        }
        let token: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        self.store_session(Some(RestSession {
            access_token: token.access_token,
            email: token.user.email,
        }));
        Ok(())
    }

    fn session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| AuthSession {
                email: s.email.clone(),
            }))
    }

    async fn update_password(&self, new_password: &str) -> Result<(), StoreError> {
        let token = self
            .session
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.access_token.clone()))
            .ok_or(StoreError::NoSession)?;

        let url = format!("{}/auth/v1/user", self.base);
        let response = self
            .client
            .put(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(map_reqwest)?;
        check_status(response).await?;
        Ok(())
    }
}
