//! The data-access facade: typed async methods over the remote store, one
//! remote call (or a short fixed sequence) each.
//!
//! Split per domain: doctor accounts, patients, medical records, the
//! dashboard read-outs and the signed-in account. Mutating methods await the
//! audit hook before returning, so a caller observing a completed mutation
//! also observes its log row.

mod account;
pub(crate) mod audit;
mod dashboard;
mod doctors;
mod patients;
mod records;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ServiceError;
use crate::session::SessionContext;
use crate::store::{RemoteStore, StoreError};

/// The facade. Generic over the store so tests run against
/// `store::memory::MemoryStore` and production against `store::rest::RestStore`.
pub struct DataService<S: RemoteStore> {
    store: Arc<S>,
    session: Arc<SessionContext>,
    /// Storage bucket for medical images.
    bucket: String,
}

impl<S: RemoteStore> DataService<S> {
    pub fn new(store: Arc<S>, session: Arc<SessionContext>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            session,
            bucket: bucket.into(),
        }
    }
}

/// Decode one raw row into a model type.
pub(crate) fn decode<T: DeserializeOwned>(row: Value) -> Result<T, ServiceError> {
    serde_json::from_value(row)
        .map_err(|e| ServiceError::RemoteQuery(StoreError::Decode(e.to_string())))
}

/// Decode a batch of raw rows.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, ServiceError> {
    rows.into_iter().map(decode).collect()
}
