//! Wire types of the Cloud Datastore v1 REST API.
//!
//! Only the subset the user service needs is modelled. Unknown response
//! fields are ignored so newer API revisions keep decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CloudError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
}

/// One element of a key path. A complete key's last element carries
/// either a numeric `id` (sent as a decimal string) or a `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathElement {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<PartitionId>,
    pub path: Vec<PathElement>,
}

impl Key {
    /// Numeric id of the last path element, if the key has one.
    pub fn id(&self) -> Result<Option<i64>, CloudError> {
        match self.path.last().and_then(|p| p.id.as_deref()) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| CloudError::Decode(format!("non-numeric key id '{raw}'"))),
        }
    }

    /// String name of the last path element, if the key has one.
    pub fn name(&self) -> Option<&str> {
        self.path.last().and_then(|p| p.name.as_deref())
    }
}

/// A property value. Exactly one of the typed fields is set.
///
/// `integerValue` is an int64 and travels as a decimal string in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_from_indexes: Option<bool>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            integer_value: Some(value.to_string()),
            ..Default::default()
        }
    }

    /// Mark the value as unindexed (it cannot be used in query filters).
    pub fn unindexed(mut self) -> Self {
        self.exclude_from_indexes = Some(true);
        self
    }

    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.integer_value.as_deref().and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(key: Key) -> Self {
        Self {
            key: Some(key),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.properties.get(name).and_then(Value::as_i64)
    }
}

// ── Commit ───────────────────────────────────────────────────────────

/// A single write. Exactly one operation field is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Mutation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Key>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommitRequest {
    pub mode: &'static str,
    pub mutations: Vec<Mutation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitResponse {
    #[serde(default)]
    pub mutation_results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationResult {
    #[serde(default)]
    pub key: Option<Key>,
}

// ── Lookup ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LookupRequest {
    pub keys: Vec<Key>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub found: Vec<EntityResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityResult {
    pub entity: Entity,
}

// ── Query ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct KindExpression {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyReference {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyFilter {
    pub property: PropertyReference,
    pub op: &'static str,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_filter: PropertyFilter,
}

/// A kind query with an optional equality filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub kind: Vec<KindExpression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl Query {
    /// All entities of `kind`.
    pub fn kind(kind: &str) -> Self {
        Self {
            kind: vec![KindExpression {
                name: kind.to_string(),
            }],
            filter: None,
            limit: None,
            start_cursor: None,
        }
    }

    /// Restrict to entities whose `property` equals `value`.
    pub fn filter_eq(mut self, property: &str, value: Value) -> Self {
        self.filter = Some(Filter {
            property_filter: PropertyFilter {
                property: PropertyReference {
                    name: property.to_string(),
                },
                op: "EQUAL",
                value,
            },
        });
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunQueryRequest {
    pub partition_id: PartitionId,
    pub query: Query,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryResponse {
    pub batch: QueryResultBatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryResultBatch {
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
    #[serde(default)]
    pub more_results: String,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// `moreResults` value meaning another page is available.
pub(crate) const MORE_RESULTS_NOT_FINISHED: &str = "NOT_FINISHED";
