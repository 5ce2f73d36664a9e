//! BigQuery table holding migrated users.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use userhub_cloud::bigquery::types::{TableFieldSchema, TableSchema};
use userhub_cloud::BigQueryClient;
use userhub_core::migration::{WarehouseRow, WAREHOUSE_SCHEMA};
use userhub_core::user::{UserResponse, ISO_DATE_FORMAT};

use crate::store::{InsertReport, Warehouse, WarehouseTarget};
use crate::{StoreError, StoreResult};

const DATASET_DESCRIPTION: &str = "User data storage";

/// Columns read back by [`Warehouse::query_users`]. `password` is left out.
const QUERY_COLUMNS: &str = "id, name, dateOfBirth, email, phone, gender, address";

#[derive(Debug, Clone)]
pub struct BigQueryWarehouse {
    client: BigQueryClient,
    target: WarehouseTarget,
}

impl BigQueryWarehouse {
    pub fn new(client: BigQueryClient, target: WarehouseTarget) -> Self {
        Self { client, target }
    }

    fn schema() -> TableSchema {
        TableSchema {
            fields: WAREHOUSE_SCHEMA
                .iter()
                .map(|(name, column_type)| TableFieldSchema::nullable(name, column_type.as_str()))
                .collect(),
        }
    }

    fn qualified_table(&self) -> String {
        format!(
            "`{}.{}.{}`",
            self.client.project_id(),
            self.target.dataset,
            self.target.table
        )
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    fn target(&self) -> &WarehouseTarget {
        &self.target
    }

    async fn ensure_dataset(&self) -> StoreResult<()> {
        if !self.client.dataset_exists(&self.target.dataset).await? {
            self.client
                .create_dataset(&self.target.dataset, DATASET_DESCRIPTION)
                .await?;
        }
        Ok(())
    }

    async fn ensure_table(&self) -> StoreResult<()> {
        let WarehouseTarget { dataset, table } = &self.target;
        if !self.client.table_exists(dataset, table).await? {
            self.client.create_table(dataset, table, Self::schema()).await?;
        }
        Ok(())
    }

    async fn table_exists(&self) -> StoreResult<bool> {
        Ok(self
            .client
            .table_exists(&self.target.dataset, &self.target.table)
            .await?)
    }

    async fn insert_rows(&self, rows: &[WarehouseRow]) -> StoreResult<InsertReport> {
        let errors = self
            .client
            .insert_all(&self.target.dataset, &self.target.table, rows)
            .await?;

        for rejected in &errors {
            let reason = rejected
                .errors
                .first()
                .map(|e| e.message.as_str())
                .unwrap_or("unknown");
            tracing::warn!(row = rejected.index, reason, "Warehouse rejected row");
        }

        Ok(InsertReport {
            failed_rows: errors.into_iter().map(|e| e.index).collect(),
        })
    }

    async fn query_users(&self, limit: u32) -> StoreResult<Vec<UserResponse>> {
        let sql = format!(
            "SELECT {QUERY_COLUMNS} FROM {} ORDER BY id LIMIT {limit}",
            self.qualified_table()
        );
        let response = self.client.query(&sql, limit).await?;
        response.records().iter().map(record_to_user).collect()
    }
}

/// Decode one query record. BigQuery renders every scalar as a string.
fn record_to_user(record: &Map<String, Value>) -> StoreResult<UserResponse> {
    let text = |name: &str| record.get(name).and_then(Value::as_str).unwrap_or_default().to_string();

    let id = record
        .get("id")
        .and_then(|v| match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        })
        .ok_or_else(|| StoreError::Decode {
            kind: "warehouse row",
            message: format!("missing or non-numeric id: {:?}", record.get("id")),
        })?;

    Ok(UserResponse {
        id,
        name: text("name"),
        email: text("email"),
        phone: text("phone"),
        gender: text("gender"),
        address: text("address"),
        date_of_birth: NaiveDate::parse_from_str(&text("dateOfBirth"), ISO_DATE_FORMAT).ok(),
    })
}
