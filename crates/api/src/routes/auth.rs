//! Route definitions for login and logout.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// GET  /login    -> status
/// POST /login    -> login
/// POST /logout   -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::status).post(auth::login))
        .route("/logout", post(auth::logout))
}
