//! Route definitions for `/migrate`.

use axum::routing::get;
use axum::Router;

use crate::handlers::migration;
use crate::state::AppState;

/// Routes mounted at `/migrate`.
///
/// ```text
/// GET  /            -> preview
/// POST /            -> run
/// GET  /warehouse   -> warehouse_users (?limit=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(migration::preview).post(migration::run))
        .route("/warehouse", get(migration::warehouse_users))
}
