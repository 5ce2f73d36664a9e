//! One-shot copy of every user record into the warehouse table.

use std::sync::Arc;

use serde::Serialize;
use userhub_core::migration::{to_warehouse_rows, MigrationResult};
use userhub_core::user::{User, UserResponse};
use userhub_db::{StoreError, UserStore, Warehouse};

/// Upper bound for [`MigrationPipeline::query_warehouse`].
pub const MAX_WAREHOUSE_QUERY_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("No users found in Datastore to migrate")]
    EmptySource,

    /// The source store could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a migration would copy, without copying anything.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPreview {
    pub count: usize,
    pub users: Vec<UserResponse>,
    #[serde(rename = "bigQueryTableExists")]
    pub table_exists: bool,
    pub dataset: String,
    pub table: String,
}

/// Source store plus target warehouse. Cheap to clone.
#[derive(Clone)]
pub struct MigrationPipeline {
    source: Arc<dyn UserStore>,
    warehouse: Arc<dyn Warehouse>,
}

impl MigrationPipeline {
    pub fn new(source: Arc<dyn UserStore>, warehouse: Arc<dyn Warehouse>) -> Self {
        Self { source, warehouse }
    }

    pub fn warehouse(&self) -> &dyn Warehouse {
        self.warehouse.as_ref()
    }

    /// Count and list the source users and report whether the target table
    /// already exists. A warehouse error reads as "table absent".
    pub async fn preview(&self) -> Result<MigrationPreview, MigrationError> {
        let users = self.source.list().await?;
        let table_exists = match self.warehouse.table_exists().await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(error = %e, "Could not check warehouse table");
                false
            }
        };
        let target = self.warehouse.target();

        Ok(MigrationPreview {
            count: users.len(),
            users: users.into_iter().map(UserResponse::from).collect(),
            table_exists,
            dataset: target.dataset.clone(),
            table: target.table.clone(),
        })
    }

    /// Copy every source user into the warehouse.
    ///
    /// Reading the source is the only step whose failure is an `Err`. Once
    /// the users are in hand, any warehouse failure is folded into a
    /// [`MigrationResult`] with `success: false`.
    pub async fn run(&self) -> Result<MigrationResult, MigrationError> {
        let users = self.source.list().await?;
        if users.is_empty() {
            return Err(MigrationError::EmptySource);
        }

        let total = users.len();
        tracing::info!(total, "Starting warehouse migration");

        let result = match self.copy(&users).await {
            Ok(failed_rows) => MigrationResult::from_insert(total, failed_rows),
            Err(e) => {
                tracing::error!(error = %e, total, "Warehouse migration failed");
                MigrationResult::failed(total, e)
            }
        };

        tracing::info!(
            migrated = result.migrated,
            total = result.total,
            success = result.success,
            "Warehouse migration finished",
        );
        Ok(result)
    }

    /// Ensure dataset and table, then insert. Returns the rejected row count.
    async fn copy(&self, users: &[User]) -> Result<usize, StoreError> {
        self.warehouse.ensure_dataset().await?;
        self.warehouse.ensure_table().await?;
        let report = self.warehouse.insert_rows(&to_warehouse_rows(users)).await?;
        Ok(report.failed_count())
    }

    /// Read back up to `limit` migrated users (clamped to
    /// [`MAX_WAREHOUSE_QUERY_LIMIT`]).
    pub async fn query_warehouse(&self, limit: u32) -> Result<Vec<UserResponse>, MigrationError> {
        let limit = limit.clamp(1, MAX_WAREHOUSE_QUERY_LIMIT);
        Ok(self.warehouse.query_users(limit).await?)
    }
}
