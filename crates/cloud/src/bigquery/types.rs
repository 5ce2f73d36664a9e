//! Wire types of the BigQuery v2 REST API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetResource {
    pub dataset_reference: DatasetReference,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl TableFieldSchema {
    pub fn nullable(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            mode: Some("NULLABLE".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<TableFieldSchema>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableResource {
    pub table_reference: TableReference,
    pub schema: TableSchema,
}

// ── Streaming insert ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct InsertRow<'a, T> {
    pub json: &'a T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllRequest<'a, T> {
    pub rows: Vec<InsertRow<'a, T>>,
    pub skip_invalid_rows: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllResponse {
    #[serde(default)]
    pub insert_errors: Vec<InsertErrors>,
}

/// Errors for one rejected row of an `insertAll` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsertErrors {
    /// Zero-based position of the row in the request.
    pub index: usize,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

// ── Query ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub query: &'a str,
    pub use_legacy_sql: bool,
    pub max_results: u32,
}

/// A cell of a query result row: `{ "v": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub v: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub f: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub schema: TableSchema,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub job_complete: Option<bool>,
}

impl QueryResponse {
    /// Zip each row's cells with the schema's column names.
    ///
    /// BigQuery returns every scalar as a JSON string (or `null`); values
    /// are passed through without conversion.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.schema
                    .fields
                    .iter()
                    .zip(row.f.iter())
                    .map(|(field, cell)| (field.name.clone(), cell.v.clone()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn insert_request_wraps_each_row() {
        let rows = [json!({ "id": 1 }), json!({ "id": 2 })];
        let request = InsertAllRequest {
            rows: rows.iter().map(|json| InsertRow { json }).collect(),
            skip_invalid_rows: true,
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "rows": [{ "json": { "id": 1 } }, { "json": { "id": 2 } }],
                "skipInvalidRows": true
            })
        );
    }

    #[test]
    fn insert_errors_decode() {
        let response: InsertAllResponse = serde_json::from_value(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [
                { "index": 1, "errors": [{ "reason": "invalid", "message": "bad id" }] }
            ]
        }))
        .unwrap();
        assert_eq!(response.insert_errors.len(), 1);
        assert_eq!(response.insert_errors[0].index, 1);
        assert_eq!(response.insert_errors[0].errors[0].reason, "invalid");
    }

    #[test]
    fn clean_insert_has_no_errors() {
        let response: InsertAllResponse =
            serde_json::from_value(json!({ "kind": "bigquery#tableDataInsertAllResponse" }))
                .unwrap();
        assert!(response.insert_errors.is_empty());
    }

    #[test]
    fn schema_field_uses_type_key() {
        let field = TableFieldSchema::nullable("id", "INT64");
        assert_eq!(
            serde_json::to_value(field).unwrap(),
            json!({ "name": "id", "type": "INT64", "mode": "NULLABLE" })
        );
    }

    #[test]
    fn query_records_pair_cells_with_columns() {
        let response: QueryResponse = serde_json::from_value(json!({
            "schema": { "fields": [
                { "name": "id", "type": "INTEGER" },
                { "name": "name", "type": "STRING" }
            ]},
            "rows": [
                { "f": [{ "v": "1" }, { "v": "Ann" }] },
                { "f": [{ "v": "2" }, { "v": null }] }
            ],
            "jobComplete": true
        }))
        .unwrap();

        let records = response.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], json!("1"));
        assert_eq!(records[0]["name"], json!("Ann"));
        assert_eq!(records[1]["name"], Value::Null);
    }
}
