//! Mapping between [`Session`] records and Datastore `UserSession` entities.
//!
//! Timestamps are stored as epoch milliseconds in integer properties.

use chrono::{DateTime, Utc};
use userhub_cloud::datastore::types::{Entity, Key, Value};
use userhub_core::session::Session;

use crate::{StoreError, StoreResult};

pub const SESSION_KIND: &str = "UserSession";

pub const PROP_USER_ID: &str = "userId";
pub const PROP_USER_EMAIL: &str = "userEmail";
pub const PROP_USER_NAME: &str = "userName";
pub const PROP_CREATED_AT: &str = "createdAt";
pub const PROP_EXPIRY_TIME: &str = "expiryTime";

pub fn to_entity(key: Key, session: &Session) -> Entity {
    Entity::new(key)
        .with(PROP_USER_ID, Value::integer(session.user_id))
        .with(PROP_USER_EMAIL, Value::string(&session.user_email).unindexed())
        .with(PROP_USER_NAME, Value::string(&session.user_name).unindexed())
        .with(PROP_CREATED_AT, Value::integer(session.created_at.timestamp_millis()))
        .with(PROP_EXPIRY_TIME, Value::integer(session.expires_at.timestamp_millis()))
}

pub fn from_entity(entity: &Entity) -> StoreResult<Session> {
    let id = entity
        .key
        .as_ref()
        .and_then(Key::name)
        .ok_or_else(|| decode_error("entity key has no token name".to_string()))?
        .to_string();

    let integer = |name: &str| {
        entity
            .integer(name)
            .ok_or_else(|| decode_error(format!("missing integer property '{name}'")))
    };
    let instant = |name: &str| -> StoreResult<DateTime<Utc>> {
        let millis = integer(name)?;
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| decode_error(format!("'{name}' out of range: {millis}")))
    };

    Ok(Session {
        id,
        user_id: integer(PROP_USER_ID)?,
        user_email: entity.string(PROP_USER_EMAIL).unwrap_or_default().to_string(),
        user_name: entity.string(PROP_USER_NAME).unwrap_or_default().to_string(),
        created_at: instant(PROP_CREATED_AT)?,
        expires_at: instant(PROP_EXPIRY_TIME)?,
    })
}

fn decode_error(message: String) -> StoreError {
    StoreError::Decode {
        kind: SESSION_KIND,
        message,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use userhub_cloud::datastore::types::PathElement;

    use super::*;

    fn key(name: &str) -> Key {
        Key {
            partition_id: None,
            path: vec![PathElement {
                kind: SESSION_KIND.to_string(),
                id: None,
                name: Some(name.to_string()),
            }],
        }
    }

    #[test]
    fn session_survives_entity_mapping() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let session = Session::new(
            "tok".to_string(),
            7,
            "ann@x.com".to_string(),
            "Ann".to_string(),
            now,
            Duration::minutes(30),
        )
        .unwrap();

        let entity = to_entity(key("tok"), &session);
        assert_eq!(
            entity.integer(PROP_EXPIRY_TIME),
            Some(now.timestamp_millis() + 30 * 60 * 1000)
        );
        assert_eq!(from_entity(&entity).unwrap(), session);
    }

    #[test]
    fn missing_expiry_is_a_decode_error() {
        let entity = Entity::new(key("tok"))
            .with(PROP_USER_ID, Value::integer(1))
            .with(PROP_CREATED_AT, Value::integer(0));
        assert_matches!(
            from_entity(&entity),
            Err(StoreError::Decode { kind: SESSION_KIND, message }) if message.contains(PROP_EXPIRY_TIME)
        );
    }
}
