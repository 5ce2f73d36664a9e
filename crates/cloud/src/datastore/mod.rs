//! Cloud Datastore REST client (`v1`).

pub mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::error::CloudError;
use crate::http;
use types::{
    CommitRequest, CommitResponse, Entity, Key, LookupRequest, LookupResponse, Mutation,
    PartitionId, PathElement, Query, RunQueryRequest, RunQueryResponse,
    MORE_RESULTS_NOT_FINISHED,
};

const SERVICE: &str = "Datastore";

/// Production endpoint, used unless an emulator host is configured.
pub const DEFAULT_BASE_URL: &str = "https://datastore.googleapis.com";

/// Thin async client over the Datastore `lookup`, `commit` and `runQuery`
/// methods. Cheap to clone: the HTTP client and token provider are shared.
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: TokenProvider,
}

impl DatastoreClient {
    /// Build a client for `project_id`. When `emulator_host` is set (the
    /// value of `DATASTORE_EMULATOR_HOST`), requests go there instead of
    /// the production endpoint.
    pub fn new(
        http: reqwest::Client,
        project_id: impl Into<String>,
        emulator_host: Option<&str>,
        tokens: TokenProvider,
    ) -> Self {
        let base_url = match emulator_host {
            Some(host) => http::emulator_base_url(host),
            None => DEFAULT_BASE_URL.to_string(),
        };
        Self {
            http,
            base_url,
            project_id: project_id.into(),
            tokens,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn partition(&self) -> PartitionId {
        PartitionId {
            project_id: self.project_id.clone(),
            namespace_id: None,
        }
    }

    /// A key with no id; the service allocates one on insert.
    pub fn incomplete_key(&self, kind: &str) -> Key {
        Key {
            partition_id: Some(self.partition()),
            path: vec![PathElement {
                kind: kind.to_string(),
                id: None,
                name: None,
            }],
        }
    }

    pub fn id_key(&self, kind: &str, id: i64) -> Key {
        Key {
            partition_id: Some(self.partition()),
            path: vec![PathElement {
                kind: kind.to_string(),
                id: Some(id.to_string()),
                name: None,
            }],
        }
    }

    pub fn name_key(&self, kind: &str, name: &str) -> Key {
        Key {
            partition_id: Some(self.partition()),
            path: vec![PathElement {
                kind: kind.to_string(),
                id: None,
                name: Some(name.to_string()),
            }],
        }
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Resp, CloudError> {
        let url = format!(
            "{}/v1/projects/{}:{method}",
            self.base_url, self.project_id
        );
        let response = http::send(&self.tokens, self.http.post(url).json(body)).await?;
        http::json(SERVICE, response).await
    }

    async fn commit(&self, mutations: Vec<Mutation>) -> Result<CommitResponse, CloudError> {
        let request = CommitRequest {
            mode: "NON_TRANSACTIONAL",
            mutations,
        };
        self.call("commit", &request).await
    }

    /// Fetch one entity by key; `None` when it does not exist.
    pub async fn lookup(&self, key: Key) -> Result<Option<Entity>, CloudError> {
        let response: LookupResponse = self.call("lookup", &LookupRequest { keys: vec![key] }).await?;
        Ok(response.found.into_iter().next().map(|r| r.entity))
    }

    /// Insert entities with incomplete keys in a single commit and return
    /// the allocated keys, in input order.
    pub async fn insert_all(&self, entities: Vec<Entity>) -> Result<Vec<Key>, CloudError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let expected = entities.len();
        let mutations = entities
            .into_iter()
            .map(|entity| Mutation {
                insert: Some(entity),
                ..Default::default()
            })
            .collect();

        let response = self.commit(mutations).await?;
        let keys: Vec<Key> = response
            .mutation_results
            .into_iter()
            .filter_map(|r| r.key)
            .collect();
        if keys.len() != expected {
            return Err(CloudError::Decode(format!(
                "commit returned {} allocated keys for {expected} inserts",
                keys.len()
            )));
        }
        Ok(keys)
    }

    /// Insert or overwrite an entity with a complete key.
    pub async fn upsert(&self, entity: Entity) -> Result<(), CloudError> {
        self.commit(vec![Mutation {
            upsert: Some(entity),
            ..Default::default()
        }])
        .await
        .map(|_| ())
    }

    /// Overwrite an existing entity. Fails with a `NOT_FOUND` API error if
    /// the entity does not exist.
    pub async fn update(&self, entity: Entity) -> Result<(), CloudError> {
        self.commit(vec![Mutation {
            update: Some(entity),
            ..Default::default()
        }])
        .await
        .map(|_| ())
    }

    /// Delete by key. Deleting a missing entity succeeds.
    pub async fn delete(&self, key: Key) -> Result<(), CloudError> {
        self.commit(vec![Mutation {
            delete: Some(key),
            ..Default::default()
        }])
        .await
        .map(|_| ())
    }

    /// Run a query, following result cursors until the service reports no
    /// more results or the query's own limit is reached.
    pub async fn run_query(&self, mut query: Query) -> Result<Vec<Entity>, CloudError> {
        let limit = query.limit.map(|l| l.max(0) as usize);
        let mut entities = Vec::new();

        loop {
            let request = RunQueryRequest {
                partition_id: self.partition(),
                query: query.clone(),
            };
            let response: RunQueryResponse = self.call("runQuery", &request).await?;
            let batch = response.batch;
            entities.extend(batch.entity_results.into_iter().map(|r| r.entity));

            if limit.is_some_and(|l| entities.len() >= l) {
                break;
            }
            match batch.end_cursor {
                Some(cursor) if batch.more_results == MORE_RESULTS_NOT_FINISHED => {
                    if let Some(l) = limit {
                        query.limit = Some((l - entities.len()) as i32);
                    }
                    query.start_cursor = Some(cursor);
                }
                _ => break,
            }
        }

        if let Some(l) = limit {
            entities.truncate(l);
        }
        Ok(entities)
    }
}
