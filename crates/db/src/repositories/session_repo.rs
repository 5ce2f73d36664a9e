//! Repository for `UserSession` entities in Cloud Datastore.

use async_trait::async_trait;
use userhub_cloud::DatastoreClient;
use userhub_core::session::Session;

use crate::models::session::{from_entity, to_entity, SESSION_KIND};
use crate::store::SessionStore;
use crate::StoreResult;

/// Sessions keyed by their token, so reads are a single key lookup.
#[derive(Debug, Clone)]
pub struct DatastoreSessionRepo {
    client: DatastoreClient,
}

impl DatastoreSessionRepo {
    pub fn new(client: DatastoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for DatastoreSessionRepo {
    async fn put(&self, session: &Session) -> StoreResult<()> {
        let key = self.client.name_key(SESSION_KIND, &session.id);
        self.client.upsert(to_entity(key, session)).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Session>> {
        let entity = self
            .client
            .lookup(self.client.name_key(SESSION_KIND, id))
            .await?;
        entity.as_ref().map(from_entity).transpose()
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.client
            .delete(self.client.name_key(SESSION_KIND, id))
            .await?;
        Ok(())
    }
}
