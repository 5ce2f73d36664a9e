//! Session-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use userhub_core::error::CoreError;
use userhub_core::session::{SessionData, SESSION_COOKIE_NAME};

use crate::error::AppError;
use crate::state::AppState;

/// The session of the caller, resolved from the `USER_SESSION_ID` cookie or
/// an `Authorization: Bearer` header.
///
/// Use this as an extractor parameter in any handler that requires a login:
///
/// ```ignore
/// async fn my_handler(session: AuthSession) -> AppResult<Json<()>> {
///     tracing::info!(user_id = session.user_id(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub data: SessionData,
}

impl AuthSession {
    pub fn user_id(&self) -> i64 {
        self.data.user_id
    }
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(unauthorized)?;
        let data = state
            .sessions
            .get_session(&token)
            .await
            .ok_or_else(unauthorized)?;
        Ok(AuthSession { token, data })
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized("Unauthorized".into()))
}

/// The session token carried by a request, if any. The cookie wins over the
/// header when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; USER_SESSION_ID=abc"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("USER_SESSION_ID=abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn missing_or_malformed_is_none() {
        assert_eq!(session_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        headers.insert(COOKIE, HeaderValue::from_static("USER_SESSION_ID="));
        assert_eq!(session_token(&headers), None);
    }
}
