//! Store-backed login session record and expiry rules.
//!
//! Sessions expire lazily: validity is checked when a session is read, and
//! nothing sweeps expired records in the background.

use chrono::Duration;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default time-to-live for a freshly created session, in minutes.
pub const DEFAULT_SESSION_TTL_MINS: i64 = 30;

/// Longest accepted session lifetime (one year), in minutes.
pub const MAX_SESSION_TTL_MINS: i64 = 365 * 24 * 60;

/// Cookie carrying the session token on browser clients.
pub const SESSION_COOKIE_NAME: &str = "USER_SESSION_ID";

/// A persisted login session.
///
/// `user_email` and `user_name` are a snapshot taken at login and are not
/// updated when the profile changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: DbId,
    pub user_email: String,
    pub user_name: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    /// Build a session that expires `ttl` after `now`.
    ///
    /// Fails when the expiry falls outside the representable date range.
    pub fn new(
        id: String,
        user_id: DbId,
        user_email: String,
        user_name: String,
        now: Timestamp,
        ttl: Duration,
    ) -> Result<Self, CoreError> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            CoreError::Internal(format!("session expiry overflows for a TTL of {ttl}"))
        })?;
        Ok(Self {
            id,
            user_id,
            user_email,
            user_name,
            created_at: now,
            expires_at,
        })
    }

    /// A session is still valid at the exact instant of its expiry.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    pub fn data(&self) -> SessionData {
        SessionData {
            user_id: self.user_id,
            user_email: self.user_email.clone(),
            user_name: self.user_name.clone(),
        }
    }
}

/// The part of a session exposed to handlers and clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: DbId,
    pub user_email: String,
    pub user_name: String,
}
