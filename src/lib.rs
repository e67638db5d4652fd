//! Meddesk core: the non-UI layer of a clinic admin application backed by a
//! hosted backend (relational tables, object storage, auth).
//!
//! Three pieces, wired by [`bootstrap`]:
//! - [`service::DataService`]: typed CRUD facade over the remote store,
//! - [`navigation::Navigator`]: role-based pre-navigation guard,
//! - an audit trail written after every mutating facade call.
//!
//! The embedding shell calls [`init_logging`] once, then [`bootstrap`], and
//! drives everything through the returned pair. The UI tree, styling and the
//! hosted backend itself live elsewhere.

pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod service;
pub mod session;
pub mod store;

pub use error::ServiceError;
pub use navigation::{GuardDecision, Navigator};
pub use service::DataService;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use config::{ConfigError, RemoteConfig};
use session::SessionContext;
use store::rest::RestStore;

/// Initialize tracing. Call once from the shell before anything else.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} core starting v{}", config::APP_NAME, config::APP_VERSION);
}

/// Wire the facade and the guard against the configured backend, sharing
/// one session context.
pub fn bootstrap() -> Result<(DataService<RestStore>, Navigator), ConfigError> {
    let remote = RemoteConfig::from_env()?;
    let session = Arc::new(SessionContext::new());
    let store = Arc::new(RestStore::new(&remote));

    let service = DataService::new(store, session.clone(), remote.bucket);
    let navigator = Navigator::new(session);
    Ok((service, navigator))
}
