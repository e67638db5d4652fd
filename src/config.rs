/// Application-level constants
pub const APP_NAME: &str = "Meddesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Object-storage bucket holding uploaded medical images, unless overridden
/// by `MEDDESK_IMAGE_BUCKET`.
pub const IMAGE_BUCKET: &str = "breast-cancer-images";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,meddesk=debug"
}

/// Errors from reading the remote endpoint configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Connection settings for the hosted backend.
///
/// Read once at startup; the REST store is constructed from this and never
/// re-reads the environment.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the hosted backend (no trailing slash).
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// Storage bucket for medical images.
    pub bucket: String,
}

impl RemoteConfig {
    /// Read configuration from `MEDDESK_REMOTE_URL`, `MEDDESK_ANON_KEY` and
    /// the optional `MEDDESK_IMAGE_BUCKET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("MEDDESK_REMOTE_URL")
            .map_err(|_| ConfigError::MissingVar("MEDDESK_REMOTE_URL"))?;
        let anon_key = std::env::var("MEDDESK_ANON_KEY")
            .map_err(|_| ConfigError::MissingVar("MEDDESK_ANON_KEY"))?;
        let bucket =
            std::env::var("MEDDESK_IMAGE_BUCKET").unwrap_or_else(|_| IMAGE_BUCKET.to_string());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            bucket,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_meddesk() {
        assert_eq!(APP_NAME, "Meddesk");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    // Single test for all env permutations: std::env is process-global and
    // cargo runs tests in parallel, so the vars are touched in one place only.
    #[test]
    fn from_env_reads_vars_and_defaults_bucket() {
        std::env::remove_var("MEDDESK_REMOTE_URL");
        std::env::remove_var("MEDDESK_ANON_KEY");
        std::env::remove_var("MEDDESK_IMAGE_BUCKET");

        match RemoteConfig::from_env() {
            Err(ConfigError::MissingVar(var)) => assert_eq!(var, "MEDDESK_REMOTE_URL"),
            other => panic!("expected MissingVar, got {other:?}"),
        }

        std::env::set_var("MEDDESK_REMOTE_URL", "https://example.backend.co/");
        match RemoteConfig::from_env() {
            Err(ConfigError::MissingVar(var)) => assert_eq!(var, "MEDDESK_ANON_KEY"),
            other => panic!("expected MissingVar, got {other:?}"),
        }

        std::env::set_var("MEDDESK_ANON_KEY", "anon-key");
        let config = RemoteConfig::from_env().unwrap();
        assert_eq!(config.url, "https://example.backend.co");
        assert_eq!(config.anon_key, "anon-key");
        assert_eq!(config.bucket, IMAGE_BUCKET);

        std::env::set_var("MEDDESK_IMAGE_BUCKET", "scans");
        let config = RemoteConfig::from_env().unwrap();
        assert_eq!(config.bucket, "scans");

        std::env::remove_var("MEDDESK_REMOTE_URL");
        std::env::remove_var("MEDDESK_ANON_KEY");
        std::env::remove_var("MEDDESK_IMAGE_BUCKET");
    }
}
