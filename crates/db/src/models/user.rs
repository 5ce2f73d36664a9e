//! Mapping between [`User`] records and Datastore `User` entities.

use chrono::NaiveDate;
use userhub_cloud::datastore::types::{Entity, Key, Value};
use userhub_core::user::{NewUser, User, ISO_DATE_FORMAT};

use crate::{StoreError, StoreResult};

/// Datastore kind holding user records.
pub const USER_KIND: &str = "User";

// Property names.
pub const PROP_NAME: &str = "name";
pub const PROP_EMAIL: &str = "email";
pub const PROP_PASSWORD: &str = "password";
pub const PROP_PHONE: &str = "phone";
pub const PROP_GENDER: &str = "gender";
pub const PROP_ADDRESS: &str = "address";
pub const PROP_DATE_OF_BIRTH: &str = "dateOfBirth";

/// Build the entity for `user` under `key`.
///
/// A missing date of birth is stored as `""`. Only `name` and `email` are
/// indexed; they are the only properties ever filtered on.
pub fn to_entity(key: Key, user: &NewUser) -> Entity {
    let date_of_birth = user
        .date_of_birth
        .map(|d| d.format(ISO_DATE_FORMAT).to_string())
        .unwrap_or_default();

    Entity::new(key)
        .with(PROP_NAME, Value::string(&user.name))
        .with(PROP_EMAIL, Value::string(&user.email))
        .with(PROP_PASSWORD, Value::string(&user.password).unindexed())
        .with(PROP_PHONE, Value::string(&user.phone).unindexed())
        .with(PROP_GENDER, Value::string(&user.gender).unindexed())
        .with(PROP_ADDRESS, Value::string(&user.address).unindexed())
        .with(PROP_DATE_OF_BIRTH, Value::string(date_of_birth).unindexed())
}

/// Decode a stored entity. Absent string properties read as `""`; an empty
/// or unparseable `dateOfBirth` reads as `None`.
pub fn from_entity(entity: &Entity) -> StoreResult<User> {
    let id = entity
        .key
        .as_ref()
        .map(Key::id)
        .transpose()?
        .flatten()
        .ok_or_else(|| decode_error("entity key has no numeric id"))?;

    let text = |name: &str| entity.string(name).unwrap_or_default().to_string();
    let date_of_birth = entity
        .string(PROP_DATE_OF_BIRTH)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT).ok());

    Ok(User {
        id,
        name: text(PROP_NAME),
        date_of_birth,
        email: text(PROP_EMAIL),
        password: text(PROP_PASSWORD),
        phone: text(PROP_PHONE),
        gender: text(PROP_GENDER),
        address: text(PROP_ADDRESS),
    })
}

fn decode_error(message: &str) -> StoreError {
    StoreError::Decode {
        kind: USER_KIND,
        message: message.to_string(),
    }
}
