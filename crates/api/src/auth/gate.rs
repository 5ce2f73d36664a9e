//! Credential check for `POST /login`.

use userhub_core::user::User;
use userhub_db::{StoreResult, UserStore};

/// Look the user up by email and compare the password.
///
/// Only the first record with a matching email is considered, so a
/// duplicate email registered later can never log in. Passwords are stored
/// and compared as plaintext.
pub async fn authenticate(
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> StoreResult<Option<User>> {
    let Some(user) = store.find_by_email(email).await? else {
        tracing::debug!("Login attempt for unknown email");
        return Ok(None);
    };

    if user.password == password {
        Ok(Some(user))
    } else {
        tracing::debug!(user_id = user.id, "Login attempt with wrong password");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use userhub_core::user::NewUser;
    use userhub_db::memory::MemoryUserStore;

    use super::*;

    fn user(name: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn right_password_authenticates() {
        let store = MemoryUserStore::new();
        let ann = store.create(user("Ann", "ann@x.com", "pw")).await.unwrap();

        let found = authenticate(&store, "ann@x.com", "pw").await.unwrap();
        assert_eq!(found, Some(ann));
    }

    #[tokio::test]
    async fn wrong_password_or_email_is_rejected() {
        let store = MemoryUserStore::new();
        store.create(user("Ann", "ann@x.com", "pw")).await.unwrap();

        assert!(authenticate(&store, "ann@x.com", "PW").await.unwrap().is_none());
        assert!(authenticate(&store, "ann@x.com", "").await.unwrap().is_none());
        assert!(authenticate(&store, "bob@x.com", "pw").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_only_checks_first_record() {
        let store = MemoryUserStore::new();
        store.create(user("First", "dup@x.com", "one")).await.unwrap();
        store.create(user("Second", "dup@x.com", "two")).await.unwrap();

        let first = authenticate(&store, "dup@x.com", "one").await.unwrap();
        assert_eq!(first.map(|u| u.name), Some("First".to_string()));

        // The second record's password never matches.
        assert!(authenticate(&store, "dup@x.com", "two").await.unwrap().is_none());
    }
}
