use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::upload;
use crate::state::AppState;

/// `POST /upload`, with the body limit raised for spreadsheet uploads.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(upload::upload).layer(DefaultBodyLimit::max(upload::MAX_REQUEST_BYTES)),
    )
}
