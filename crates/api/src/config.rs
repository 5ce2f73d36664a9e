use std::path::PathBuf;
use std::str::FromStr;

use userhub_core::migration::{DEFAULT_DATASET, DEFAULT_TABLE};
use userhub_core::session::{DEFAULT_SESSION_TTL_MINS, MAX_SESSION_TTL_MINS};

/// A configuration variable held an unusable value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be set when STORE_BACKEND=datastore")]
    Missing(&'static str),
}

/// Which family of stores backs users, sessions and the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Cloud Datastore plus BigQuery.
    Datastore,
    /// Process-local maps. Data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datastore" => Ok(Self::Datastore),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Storage settings. Cloud fields are only consulted for
/// [`StoreBackend::Datastore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Google Cloud project owning the Datastore database and BigQuery dataset.
    pub project_id: Option<String>,
    pub datastore_emulator_host: Option<String>,
    pub bigquery_emulator_host: Option<String>,
    pub dataset: String,
    pub table: String,
    /// Service-account key file used to mint access tokens.
    pub credentials_file: Option<PathBuf>,
    /// Pre-minted access token. Takes precedence over `credentials_file`.
    pub access_token: Option<String>,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session lifetime in minutes (default: `30`).
    pub session_ttl_mins: i64,
    pub store: StoreConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `HOST`                           | `0.0.0.0`               |
    /// | `PORT`                           | `3000`                  |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`                    |
    /// | `SESSION_TTL_MINS`               | `30`                    |
    /// | `STORE_BACKEND`                  | `datastore`             |
    /// | `GOOGLE_CLOUD_PROJECT`           | required for datastore  |
    /// | `DATASTORE_EMULATOR_HOST`        | unset                   |
    /// | `BIGQUERY_EMULATOR_HOST`         | unset                   |
    /// | `BIGQUERY_DATASET`               | `user_data`             |
    /// | `BIGQUERY_TABLE`                 | `User`                  |
    /// | `GOOGLE_APPLICATION_CREDENTIALS` | unset                   |
    /// | `GOOGLE_OAUTH_ACCESS_TOKEN`      | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reads variables through
    /// `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&var, "PORT", 3000u16, "a valid port number")?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs =
            parse_or(&var, "REQUEST_TIMEOUT_SECS", 30u64, "a whole number of seconds")?;

        let session_ttl_mins = parse_or(
            &var,
            "SESSION_TTL_MINS",
            DEFAULT_SESSION_TTL_MINS,
            "a whole number of minutes",
        )?;
        if !(1..=MAX_SESSION_TTL_MINS).contains(&session_ttl_mins) {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_MINS",
                value: session_ttl_mins.to_string(),
                expected: "between 1 minute and one year (525600)",
            });
        }

        let backend = match var("STORE_BACKEND") {
            None => StoreBackend::Datastore,
            Some(raw) => raw.parse().map_err(|()| ConfigError::Invalid {
                var: "STORE_BACKEND",
                value: raw,
                expected: "'datastore' or 'memory'",
            })?,
        };

        let store = StoreConfig {
            backend,
            project_id: var("GOOGLE_CLOUD_PROJECT"),
            datastore_emulator_host: var("DATASTORE_EMULATOR_HOST"),
            bigquery_emulator_host: var("BIGQUERY_EMULATOR_HOST"),
            dataset: var("BIGQUERY_DATASET").unwrap_or_else(|| DEFAULT_DATASET.into()),
            table: var("BIGQUERY_TABLE").unwrap_or_else(|| DEFAULT_TABLE.into()),
            credentials_file: var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            access_token: var("GOOGLE_OAUTH_ACCESS_TOKEN"),
        };

        if store.backend == StoreBackend::Datastore && store.project_id.is_none() {
            return Err(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"));
        }

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session_ttl_mins,
            store,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: name,
            value: raw,
            expected,
        }),
    }
}
