use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use userhub_cloud::auth::ServiceAccountKey;
use userhub_cloud::{BigQueryClient, CloudError, DatastoreClient, TokenProvider};
use userhub_db::memory::{MemorySessionStore, MemoryUserStore, MemoryWarehouse};
use userhub_db::repositories::{BigQueryWarehouse, DatastoreSessionRepo, DatastoreUserRepo};
use userhub_db::{SessionStore, UserStore, Warehouse, WarehouseTarget};
use userhub_pipeline::MigrationPipeline;

use crate::auth::SessionManager;
use crate::config::{ConfigError, ServerConfig, StoreBackend, StoreConfig};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// User record store.
    pub users: Arc<dyn UserStore>,
    /// Login sessions.
    pub sessions: SessionManager,
    /// User store to warehouse copy.
    pub migration: MigrationPipeline,
}

impl AppState {
    /// Wire handlers to an explicit set of stores.
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        let ttl = Duration::try_minutes(config.session_ttl_mins).unwrap_or(Duration::MAX);
        Self {
            config: Arc::new(config),
            sessions: SessionManager::new(sessions, ttl),
            migration: MigrationPipeline::new(Arc::clone(&users), warehouse),
            users,
        }
    }

    /// Build the stores selected by `config.store.backend`.
    pub fn from_config(config: ServerConfig) -> Result<Self, StateError> {
        let target = WarehouseTarget {
            dataset: config.store.dataset.clone(),
            table: config.store.table.clone(),
        };

        match config.store.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                Ok(Self::new(
                    config,
                    Arc::new(MemoryUserStore::new()),
                    Arc::new(MemorySessionStore::new()),
                    Arc::new(MemoryWarehouse::new(target)),
                ))
            }
            StoreBackend::Datastore => {
                let project_id = config
                    .store
                    .project_id
                    .clone()
                    .ok_or(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"))?;

                let http = reqwest::Client::builder()
                    .timeout(StdDuration::from_secs(config.request_timeout_secs))
                    .build()
                    .map_err(CloudError::from)?;
                let tokens = token_provider(&config.store, http.clone())?;

                let datastore = DatastoreClient::new(
                    http.clone(),
                    project_id.clone(),
                    config.store.datastore_emulator_host.as_deref(),
                    tokens.clone(),
                );
                let bigquery = BigQueryClient::new(
                    http,
                    project_id.clone(),
                    config.store.bigquery_emulator_host.as_deref(),
                    tokens,
                );
                tracing::info!(
                    project_id = %project_id,
                    dataset = %target.dataset,
                    table = %target.table,
                    "Using Datastore and BigQuery stores",
                );

                Ok(Self::new(
                    config,
                    Arc::new(DatastoreUserRepo::new(datastore.clone())),
                    Arc::new(DatastoreSessionRepo::new(datastore)),
                    Arc::new(BigQueryWarehouse::new(bigquery, target)),
                ))
            }
        }
    }
}

/// Startup failure while building [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Pick a token source: a static token, then a key file, then none.
fn token_provider(store: &StoreConfig, http: reqwest::Client) -> Result<TokenProvider, CloudError> {
    if let Some(token) = &store.access_token {
        tracing::info!("Authenticating cloud calls with a static access token");
        return Ok(TokenProvider::fixed(token.clone()));
    }
    if let Some(path) = &store.credentials_file {
        let key = ServiceAccountKey::from_file(path)?;
        tracing::info!(client_email = %key.client_email, "Authenticating cloud calls with a service account");
        return Ok(TokenProvider::service_account(key, http));
    }
    if store.datastore_emulator_host.is_none() || store.bigquery_emulator_host.is_none() {
        tracing::warn!("No cloud credentials configured; production API calls will be rejected");
    }
    Ok(TokenProvider::anonymous())
}
