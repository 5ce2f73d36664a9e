//! REST clients for the managed Google Cloud services the user service
//! delegates storage to.
//!
//! - [`datastore`] -- Cloud Datastore (document store for users and sessions).
//! - [`bigquery`] -- BigQuery (analytical warehouse, migration target).
//! - [`auth`] -- OAuth2 bearer tokens for both.
//!
//! Both clients honour emulator host overrides so local development and
//! CI never need real credentials.

pub mod auth;
pub mod bigquery;
pub mod datastore;
pub mod error;

mod http;

pub use auth::TokenProvider;
pub use bigquery::BigQueryClient;
pub use datastore::DatastoreClient;
pub use error::CloudError;
