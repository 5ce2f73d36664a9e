//! User profile record and its input/output projections.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::DbId;

/// Date format used for date-of-birth everywhere it is rendered as text.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// A persisted user profile.
///
/// Contains the plaintext password -- NEVER serialize this to API responses
/// directly. Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
}

/// A user profile that has not been persisted yet (no id assigned).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
}

impl NewUser {
    /// Attach a store-assigned id, producing the persisted record.
    pub fn with_id(self, id: DbId) -> User {
        User {
            id,
            name: self.name,
            date_of_birth: self.date_of_birth,
            email: self.email,
            password: self.password,
            phone: self.phone,
            gender: self.gender,
            address: self.address,
        }
    }
}

impl User {
    /// Case-insensitive substring match on the name.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Safe user representation for API responses (no password).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender.clone(),
            address: user.address.clone(),
            date_of_birth: user.date_of_birth,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            gender: user.gender,
            address: user.address,
            date_of_birth: user.date_of_birth,
        }
    }
}

/// Request payload for creating or replacing a user.
///
/// `name`, `email` and `password` are required and must be non-empty; the
/// remaining fields are optional. Missing required fields deserialize to an
/// empty string so validation can report them by name.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
}

impl UserPayload {
    /// Validate the payload and convert it into an unpersisted record.
    pub fn into_new_user(self) -> Result<NewUser, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let date_of_birth = match self.date_of_birth.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT).map_err(|_| {
                CoreError::Validation(format!(
                    "dateOfBirth must be an ISO date (YYYY-MM-DD), got '{raw}'"
                ))
            })?),
        };

        Ok(NewUser {
            name: self.name,
            date_of_birth,
            email: self.email,
            password: self.password,
            phone: self.phone.unwrap_or_default(),
            gender: self.gender.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
        })
    }
}
