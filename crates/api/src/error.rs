use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use userhub_core::error::CoreError;
use userhub_db::StoreError;
use userhub_pipeline::{ImportError, MigrationError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, the store and pipeline errors for
/// backend failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce `{ "success": false, "message", "code" }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `userhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A record store or warehouse failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The uploaded payload exceeds a size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Backend errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                internal()
            }

            AppError::Import(err) => match err {
                ImportError::Unreadable(_) => {
                    (StatusCode::BAD_REQUEST, "UNREADABLE_FILE", err.to_string())
                }
                ImportError::NoValidRows { .. } => {
                    (StatusCode::BAD_REQUEST, "NO_VALID_ROWS", err.to_string())
                }
                ImportError::Store(store) => {
                    tracing::error!(error = %store, "Store error during import");
                    internal()
                }
            },

            AppError::Migration(err) => match err {
                MigrationError::EmptySource => {
                    (StatusCode::BAD_REQUEST, "EMPTY_SOURCE", err.to_string())
                }
                MigrationError::Store(store) => {
                    tracing::error!(error = %store, "Store error during migration");
                    internal()
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
        };

        let body = json!({
            "success": false,
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}
