//! Handlers for `/login` and `/logout`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use userhub_core::error::CoreError;
use userhub_core::session::{SessionData, SESSION_COOKIE_NAME};
use userhub_core::user::UserResponse;

use crate::auth::authenticate;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::session_token;
use crate::state::AppState;

const NO_STORE: &str = "no-cache, no-store, must-revalidate";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: UserResponse,
    pub session_id: String,
}

/// Response for `GET /login`.
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionData>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /login
///
/// Check email + password, open a session and hand its token back both in
/// the body and as the `USER_SESSION_ID` cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;

    let user = authenticate(state.users.as_ref(), &input.email, &input.password)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    let session_id = state
        .sessions
        .create_session(user.id, &user.email, &user.name)
        .await?;
    tracing::info!(user_id = user.id, "Login successful");

    let cookie = Cookie::build((SESSION_COOKIE_NAME, session_id.clone()))
        .path("/")
        .max_age(time::Duration::minutes(state.config.session_ttl_mins))
        .http_only(true);

    Ok((
        [(CACHE_CONTROL, NO_STORE)],
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            message: "Login successful",
            user: UserResponse::from(user),
            session_id,
        }),
    ))
}

/// GET /login
///
/// Report whether the caller holds a live session. Never fails with 401.
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let user = match session_token(&headers) {
        Some(token) => state.sessions.get_session(&token).await,
        None => None,
    };

    (
        [(CACHE_CONTROL, NO_STORE)],
        Json(AuthStatus {
            authenticated: user.is_some(),
            user,
        }),
    )
}

/// POST /logout
///
/// Drop the server-side session, if any, and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        state.sessions.delete_session(&token).await;
    }

    (
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/")),
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
}
