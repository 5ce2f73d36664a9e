//! Handlers for `/migrate` (Datastore to BigQuery copy).

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use userhub_core::migration::MigrationResult;
use userhub_core::user::UserResponse;
use userhub_pipeline::MigrationPreview;

use crate::error::AppResult;
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

const DEFAULT_WAREHOUSE_LIMIT: u32 = 100;

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(flatten)]
    pub preview: MigrationPreview,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WarehouseUsersResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
    pub count: usize,
}

/// GET /migrate
///
/// What a migration would copy, and whether the warehouse table exists yet.
pub async fn preview(
    _session: AuthSession,
    State(state): State<AppState>,
) -> AppResult<Json<PreviewResponse>> {
    let preview = state.migration.preview().await?;
    Ok(Json(PreviewResponse {
        success: true,
        preview,
    }))
}

/// POST /migrate
///
/// Copy every user to the warehouse. Warehouse failures come back as a
/// `success: false` result with status 200; an empty source is a 400.
pub async fn run(
    session: AuthSession,
    State(state): State<AppState>,
) -> AppResult<Json<MigrationResult>> {
    tracing::info!(user_id = session.user_id(), "Migration requested");
    let result = state.migration.run().await?;
    Ok(Json(result))
}

/// GET /migrate/warehouse
pub async fn warehouse_users(
    _session: AuthSession,
    State(state): State<AppState>,
    params: Result<Query<WarehouseParams>, QueryRejection>,
) -> AppResult<Json<WarehouseUsersResponse>> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_WAREHOUSE_LIMIT);
    let users = state.migration.query_warehouse(limit).await?;
    Ok(Json(WarehouseUsersResponse {
        success: true,
        count: users.len(),
        users,
    }))
}
