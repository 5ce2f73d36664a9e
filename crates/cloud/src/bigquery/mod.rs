//! BigQuery REST client (`v2`): datasets, tables, streaming inserts and
//! synchronous queries.

pub mod types;

use reqwest::StatusCode;
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::error::CloudError;
use crate::http;
use types::{
    DatasetReference, DatasetResource, InsertAllRequest, InsertAllResponse, InsertErrors,
    InsertRow, QueryRequest, QueryResponse, TableReference, TableResource, TableSchema,
};

const SERVICE: &str = "BigQuery";

pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

const DATASET_LOCATION: &str = "US";

#[derive(Debug, Clone)]
pub struct BigQueryClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: TokenProvider,
}

impl BigQueryClient {
    /// Build a client for `project_id`, optionally pointed at an emulator
    /// (`BIGQUERY_EMULATOR_HOST`).
    pub fn new(
        http: reqwest::Client,
        project_id: impl Into<String>,
        emulator_host: Option<&str>,
        tokens: TokenProvider,
    ) -> Self {
        let base_url = match emulator_host {
            Some(host) => format!("{}/bigquery/v2", http::emulator_base_url(host)),
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

    fn dataset_url(&self, dataset: &str) -> String {
        format!(
            "{}/projects/{}/datasets/{dataset}",
            self.base_url, self.project_id
        )
    }

    fn table_url(&self, dataset: &str, table: &str) -> String {
        format!("{}/tables/{table}", self.dataset_url(dataset))
    }

    pub async fn dataset_exists(&self, dataset: &str) -> Result<bool, CloudError> {
        let response = http::send(&self.tokens, self.http.get(self.dataset_url(dataset))).await?;
        http::exists(SERVICE, response).await
    }

    /// Create a dataset. A concurrent creator winning the race (409) is
    /// treated as success.
    pub async fn create_dataset(&self, dataset: &str, description: &str) -> Result<(), CloudError> {
        let url = format!("{}/projects/{}/datasets", self.base_url, self.project_id);
        let body = DatasetResource {
            dataset_reference: DatasetReference {
                project_id: self.project_id.clone(),
                dataset_id: dataset.to_string(),
            },
            description: description.to_string(),
            location: DATASET_LOCATION.to_string(),
        };
        let response = http::send(&self.tokens, self.http.post(url).json(&body)).await?;
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(dataset, "Dataset already exists");
            return Ok(());
        }
        http::check(SERVICE, response).await?;
        tracing::info!(dataset, "Created BigQuery dataset");
        Ok(())
    }

    pub async fn table_exists(&self, dataset: &str, table: &str) -> Result<bool, CloudError> {
        let response =
            http::send(&self.tokens, self.http.get(self.table_url(dataset, table))).await?;
        http::exists(SERVICE, response).await
    }

    /// Create a table with `schema`. 409 is treated as success.
    pub async fn create_table(
        &self,
        dataset: &str,
        table: &str,
        schema: TableSchema,
    ) -> Result<(), CloudError> {
        let url = format!("{}/tables", self.dataset_url(dataset));
        let body = TableResource {
            table_reference: TableReference {
                project_id: self.project_id.clone(),
                dataset_id: dataset.to_string(),
                table_id: table.to_string(),
            },
            schema,
        };
        let response = http::send(&self.tokens, self.http.post(url).json(&body)).await?;
        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(dataset, table, "Table already exists");
            return Ok(());
        }
        http::check(SERVICE, response).await?;
        tracing::info!(dataset, table, "Created BigQuery table");
        Ok(())
    }

    /// Stream `rows` into a table with `skipInvalidRows` set, so valid rows
    /// land even when others are rejected. Returns the per-row rejections.
    pub async fn insert_all<T: Serialize>(
        &self,
        dataset: &str,
        table: &str,
        rows: &[T],
    ) -> Result<Vec<InsertErrors>, CloudError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/insertAll", self.table_url(dataset, table));
        let body = InsertAllRequest {
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
            skip_invalid_rows: true,
        };
        let response = http::send(&self.tokens, self.http.post(url).json(&body)).await?;
        let decoded: InsertAllResponse = http::json(SERVICE, response).await?;
        Ok(decoded.insert_errors)
    }

    /// Run a standard-SQL query synchronously and return the first page.
    pub async fn query(&self, sql: &str, max_results: u32) -> Result<QueryResponse, CloudError> {
        let url = format!("{}/projects/{}/queries", self.base_url, self.project_id);
        let body = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            max_results,
        };
        let response = http::send(&self.tokens, self.http.post(url).json(&body)).await?;
        let decoded: QueryResponse = http::json(SERVICE, response).await?;
        if decoded.job_complete == Some(false) {
            return Err(CloudError::Decode(
                "query did not complete within the request timeout".to_string(),
            ));
        }
        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(emulator: Option<&str>) -> BigQueryClient {
        BigQueryClient::new(
            reqwest::Client::new(),
            "demo-project",
            emulator,
            TokenProvider::anonymous(),
        )
    }

    #[test]
    fn table_url_nests_under_dataset() {
        assert_eq!(
            client(None).table_url("user_data", "User"),
            "https://bigquery.googleapis.com/bigquery/v2/projects/demo-project/datasets/user_data/tables/User"
        );
    }

    #[test]
    fn emulator_keeps_api_prefix() {
        assert_eq!(
            client(Some("localhost:9050")).dataset_url("d"),
            "http://localhost:9050/bigquery/v2/projects/demo-project/datasets/d"
        );
    }
}
