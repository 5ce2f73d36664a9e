pub mod auth;
pub mod health;
pub mod migration;
pub mod upload;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the route tree. Everything is mounted at the root.
///
/// Route hierarchy:
///
/// ```text
/// /health                 service health (public)
///
/// /login                  login, session status (public)
/// /logout                 logout (public)
///
/// /users                  list, create (requires session)
/// /users/{id}             get, update, delete (requires session)
///
/// /upload                 spreadsheet bulk import (public)
///
/// /migrate                preview, run (requires session)
/// /migrate/warehouse      read back migrated users (requires session)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Login / logout.
        .merge(auth::router())
        // User CRUD.
        .nest("/users", users::router())
        // Spreadsheet import.
        .merge(upload::router())
        // Datastore to BigQuery migration.
        .nest("/migrate", migration::router())
}
