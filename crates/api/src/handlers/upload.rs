//! Handler for `POST /upload` (spreadsheet bulk import).

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use userhub_core::importer::SkippedRow;
use userhub_core::user::UserResponse;
use userhub_pipeline::import_workbook;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest accepted spreadsheet.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Largest accepted multipart request body.
pub const MAX_REQUEST_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub users: Vec<UserResponse>,
    pub skipped: Vec<SkippedRow>,
}

/// POST /upload
///
/// Accepts a multipart form with a `file` field holding an xlsx/xls/ods
/// workbook. Every non-header row of the first sheet becomes a user; rows
/// that cannot be read are listed under `skipped`.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.xlsx").to_string();
        let data = field.bytes().await.map_err(multipart_error)?;
        file = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = file
        .filter(|(_, data)| !data.is_empty())
        .ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;

    if data.len() > MAX_FILE_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MB upload limit",
            MAX_FILE_BYTES / (1024 * 1024)
        )));
    }

    tracing::info!(filename = %filename, bytes = data.len(), "Importing uploaded spreadsheet");
    let outcome = import_workbook(state.users.as_ref(), data).await?;
    let count = outcome.users.len();
    tracing::info!(
        imported = count,
        skipped = outcome.skipped.len(),
        blank = outcome.blank_rows,
        "Spreadsheet import finished",
    );

    Ok(Json(UploadResponse {
        success: true,
        message: format!("Successfully uploaded {count} users"),
        count,
        users: outcome.users.into_iter().map(UserResponse::from).collect(),
        skipped: outcome.skipped,
    }))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}
