//! Session lifecycle on top of a [`SessionStore`].
//!
//! Expiry is lazy: a session past its expiry is deleted by the first read
//! that notices it. Nothing sweeps the store in the background.

use std::sync::Arc;

use chrono::{Duration, Utc};
use userhub_core::session::{Session, SessionData};
use userhub_core::types::{DbId, Timestamp};
use userhub_db::SessionStore;
use uuid::Uuid;

use crate::error::AppResult;

/// Creates, validates and deletes login sessions. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Persist a new session for the user and return its token.
    ///
    /// Fails on a store error or when the TTL pushes the expiry out of range.
    pub async fn create_session(
        &self,
        user_id: DbId,
        user_email: &str,
        user_name: &str,
    ) -> AppResult<String> {
        let session = Session::new(
            Uuid::new_v4().to_string(),
            user_id,
            user_email.to_string(),
            user_name.to_string(),
            Utc::now(),
            self.ttl,
        )?;
        self.store.put(&session).await?;
        tracing::debug!(user_id, expires_at = %session.expires_at, "Session created");
        Ok(session.id)
    }

    /// The session's data if it exists and has not expired.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionData> {
        self.get_session_at(session_id, Utc::now()).await
    }

    /// [`SessionManager::get_session`] evaluated at `now`.
    ///
    /// Fails closed: an empty token, a missing or expired record, and a store
    /// error all read as `None`.
    pub async fn get_session_at(&self, session_id: &str, now: Timestamp) -> Option<SessionData> {
        if session_id.is_empty() {
            return None;
        }

        let session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                return None;
            }
        };

        if session.is_expired_at(now) {
            tracing::debug!(user_id = session.user_id, "Session expired");
            self.delete_session(session_id).await;
            return None;
        }

        Some(session.data())
    }

    /// Remove a session. Missing sessions and store errors are not reported
    /// to the caller; errors are logged.
    pub async fn delete_session(&self, session_id: &str) {
        if session_id.is_empty() {
            return;
        }
        if let Err(e) = self.store.delete(session_id).await {
            tracing::warn!(error = %e, "Session delete failed");
        }
    }
}
