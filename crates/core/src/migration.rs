//! Warehouse row shape and migration result accounting.
//!
//! The migration copies every user record into an append-only analytical
//! table. Per-row insert failures are tolerated and only reduce the
//! migrated count; any other failure collapses the whole run into a single
//! failed result.

use serde::{Deserialize, Serialize};

use crate::types::DbId;
use crate::user::{User, ISO_DATE_FORMAT};

/// Default warehouse dataset name.
pub const DEFAULT_DATASET: &str = "user_data";

/// Default warehouse table name.
pub const DEFAULT_TABLE: &str = "User";

/// Column type in the warehouse table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int64 => "INT64",
            Self::String => "STRING",
        }
    }
}

/// The fixed 8-column schema of the warehouse user table.
pub const WAREHOUSE_SCHEMA: [(&str, ColumnType); 8] = [
    ("id", ColumnType::Int64),
    ("name", ColumnType::String),
    ("dateOfBirth", ColumnType::String),
    ("email", ColumnType::String),
    ("password", ColumnType::String),
    ("phone", ColumnType::String),
    ("gender", ColumnType::String),
    ("address", ColumnType::String),
];

/// One row of the warehouse user table. Field names match
/// [`WAREHOUSE_SCHEMA`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseRow {
    pub id: DbId,
    pub name: String,
    /// ISO date, or an empty string when the user has no date of birth.
    pub date_of_birth: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
}

impl From<&User> for WarehouseRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            date_of_birth: user
                .date_of_birth
                .map(|d| d.format(ISO_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            email: user.email.clone(),
            password: user.password.clone(),
            phone: user.phone.clone(),
            gender: user.gender.clone(),
            address: user.address.clone(),
        }
    }
}

/// Convert a full record set into warehouse rows, preserving order.
pub fn to_warehouse_rows(users: &[User]) -> Vec<WarehouseRow> {
    users.iter().map(WarehouseRow::from).collect()
}

/// Summary of one migration invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationResult {
    pub success: bool,
    pub migrated: usize,
    pub total: usize,
    pub message: String,
}

impl MigrationResult {
    /// Account for an insert of `total` rows where `failed_rows` were
    /// rejected. Row rejections never turn the run into a failure.
    pub fn from_insert(total: usize, failed_rows: usize) -> Self {
        if failed_rows == 0 {
            return Self {
                success: true,
                migrated: total,
                total,
                message: format!("{total} users successfully migrated to BigQuery"),
            };
        }

        let migrated = total.saturating_sub(failed_rows);
        Self {
            success: true,
            migrated,
            total,
            message: format!("{migrated} users migrated to BigQuery with some errors"),
        }
    }

    /// A run that failed outright; nothing is counted as migrated.
    pub fn failed(total: usize, reason: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            migrated: 0,
            total,
            message: format!("Migration failed: {reason}"),
        }
    }
}
