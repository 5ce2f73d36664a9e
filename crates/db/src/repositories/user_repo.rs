//! Repository for `User` entities in Cloud Datastore.

use async_trait::async_trait;
use userhub_cloud::datastore::types::{Query, Value};
use userhub_cloud::DatastoreClient;
use userhub_core::types::DbId;
use userhub_core::user::{NewUser, User};

use crate::models::user::{from_entity, to_entity, PROP_EMAIL, USER_KIND};
use crate::store::UserStore;
use crate::{StoreError, StoreResult};

/// Datastore rejects commits with more mutations than this.
const MAX_MUTATIONS_PER_COMMIT: usize = 500;

/// Datastore-backed user store. Every call is a network round trip.
#[derive(Debug, Clone)]
pub struct DatastoreUserRepo {
    client: DatastoreClient,
}

impl DatastoreUserRepo {
    pub fn new(client: DatastoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserStore for DatastoreUserRepo {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        self.create_many(vec![user])
            .await?
            .pop()
            .ok_or_else(|| missing_id("commit allocated no key"))
    }

    async fn create_many(&self, users: Vec<NewUser>) -> StoreResult<Vec<User>> {
        let mut created = Vec::with_capacity(users.len());

        for chunk in users.chunks(MAX_MUTATIONS_PER_COMMIT) {
            let entities = chunk
                .iter()
                .map(|u| to_entity(self.client.incomplete_key(USER_KIND), u))
                .collect();
            let keys = self.client.insert_all(entities).await?;

            for (user, key) in chunk.iter().zip(keys) {
                let id = key
                    .id()?
                    .ok_or_else(|| missing_id("commit returned a key without an id"))?;
                created.push(user.clone().with_id(id));
            }
        }

        tracing::debug!(count = created.len(), "Inserted user entities");
        Ok(created)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        let entity = self.client.lookup(self.client.id_key(USER_KIND, id)).await?;
        entity.as_ref().map(from_entity).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = Query::kind(USER_KIND)
            .filter_eq(PROP_EMAIL, Value::string(email))
            .limit(1);
        let entities = self.client.run_query(query).await?;
        entities.first().map(from_entity).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let entities = self.client.run_query(Query::kind(USER_KIND)).await?;
        entities.iter().map(from_entity).collect()
    }

    async fn update(&self, id: DbId, profile: NewUser) -> StoreResult<Option<User>> {
        let key = self.client.id_key(USER_KIND, id);
        if self.client.lookup(key.clone()).await?.is_none() {
            return Ok(None);
        }
        self.client.update(to_entity(key, &profile)).await?;
        Ok(Some(profile.with_id(id)))
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        let key = self.client.id_key(USER_KIND, id);
        if self.client.lookup(key.clone()).await?.is_none() {
            return Ok(false);
        }
        self.client.delete(key).await?;
        Ok(true)
    }
}

fn missing_id(message: &str) -> StoreError {
    StoreError::Decode {
        kind: USER_KIND,
        message: message.to_string(),
    }
}
