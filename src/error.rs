//! Unified error taxonomy for the data-access facade.
//!
//! Single-step CRUD failures propagate as `RemoteQuery` unchanged. Multi-step
//! operations abort at the first failing step and tag the step that failed
//! (`AuthProvisioning`, `Unlink`, `StorageUpload`) so callers branch on kind,
//! never on message text. Nothing is retried.

use crate::store::StoreError;

/// Errors surfaced by `DataService` methods.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Generic backend failure on a single-step query.
    #[error("Remote query failed: {0}")]
    RemoteQuery(#[from] StoreError),

    /// Auth account creation failed; no profile row was inserted.
    #[error("Auth provisioning failed: {0}")]
    AuthProvisioning(String),

    /// Pre-delete foreign-key cleanup failed; the delete was aborted.
    #[error("Failed to unlink activity logs: {0}")]
    Unlink(StoreError),

    /// File upload failed; the record insert was skipped.
    #[error("Storage upload failed: {0}")]
    StorageUpload(StoreError),

    /// Re-authentication with the current password failed.
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// An operation requiring a signed-in session found none.
    #[error("No authenticated session")]
    NotAuthenticated,
}
