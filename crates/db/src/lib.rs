//! Record store adapter.
//!
//! The rest of the service talks to storage only through the traits in
//! [`store`]. Two families of implementations exist:
//!
//! - [`repositories`] -- durable, backed by Cloud Datastore (users and
//!   sessions) and BigQuery (the migration warehouse).
//! - [`memory`] -- volatile maps behind a mutex, for local runs and tests.

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

use userhub_cloud::CloudError;

pub use store::{InsertReport, SessionStore, UserStore, Warehouse, WarehouseTarget};

/// Errors raised by any store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// A stored entity could not be mapped back to a domain record.
    #[error("Malformed {kind} entity: {message}")]
    Decode { kind: &'static str, message: String },

    /// The backend refused the operation outright.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
