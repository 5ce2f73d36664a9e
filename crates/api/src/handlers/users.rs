//! Handlers for the `/users` resource.
//!
//! Every handler requires a login session ([`AuthSession`]). Responses never
//! carry the password field.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use userhub_core::error::CoreError;
use userhub_core::types::DbId;
use userhub_core::user::{UserPayload, UserResponse};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthSession;
use crate::state::AppState;

/// Query parameters for `GET /users`.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    /// Case-insensitive substring filter on the name.
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Parse the `{id}` path segment, answering 400 for anything non-numeric.
fn parse_id(raw: &str) -> AppResult<DbId> {
    raw.trim()
        .parse::<DbId>()
        .map_err(|_| AppError::BadRequest("Invalid user ID".into()))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "User", id })
}

/// GET /users
pub async fn list(
    _session: AuthSession,
    State(state): State<AppState>,
    params: Result<Query<ListUsersParams>, QueryRejection>,
) -> AppResult<Json<UserListResponse>> {
    let Query(params) = params?;
    let users = match params.name.as_deref().map(str::trim) {
        Some(needle) if !needle.is_empty() => state.users.search_by_name(needle).await?,
        _ => state.users.list().await?,
    };

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// GET /users/{id}
pub async fn get_by_id(
    _session: AuthSession,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<UserEnvelope>> {
    let id = parse_id(&raw_id)?;
    let user = state.users.find_by_id(id).await?.ok_or_else(|| not_found(id))?;

    Ok(Json(UserEnvelope {
        success: true,
        message: None,
        user: user.into(),
    }))
}

/// POST /users
///
/// Returns 201 with the stored user, including its generated id.
pub async fn create(
    session: AuthSession,
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserEnvelope>)> {
    let Json(input) = payload?;
    let new_user = input.into_new_user()?;

    let user = state.users.create(new_user).await?;
    tracing::info!(user_id = user.id, created_by = session.user_id(), "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            success: true,
            message: Some("User created successfully"),
            user: user.into(),
        }),
    ))
}

/// PUT /users/{id}
///
/// Replaces every profile field; optional fields left out are cleared.
pub async fn update(
    session: AuthSession,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> AppResult<Json<UserEnvelope>> {
    let id = parse_id(&raw_id)?;
    let Json(input) = payload?;
    let profile = input.into_new_user()?;

    let user = state
        .users
        .update(id, profile)
        .await?
        .ok_or_else(|| not_found(id))?;
    tracing::info!(user_id = id, updated_by = session.user_id(), "User updated");

    Ok(Json(UserEnvelope {
        success: true,
        message: Some("User updated successfully"),
        user: user.into(),
    }))
}

/// DELETE /users/{id}
pub async fn delete(
    session: AuthSession,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let id = parse_id(&raw_id)?;

    if !state.users.delete(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(user_id = id, deleted_by = session.user_id(), "User deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "User deleted successfully",
    }))
}
