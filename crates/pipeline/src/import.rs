//! Spreadsheet bulk import.
//!
//! Opens the first worksheet of an uploaded workbook, maps its rows with
//! [`userhub_core::importer::parse_range`] and persists the accepted users
//! in one batch.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use userhub_core::importer::{parse_range, SkippedRow};
use userhub_core::user::User;
use userhub_db::{StoreError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The upload is not a workbook calamine can open, or has no sheet.
    #[error("Unable to read spreadsheet: {0}")]
    Unreadable(String),

    #[error("No valid users found in the Excel file")]
    NoValidRows { skipped: Vec<SkippedRow> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Users created by one upload plus the rows that were left out.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub users: Vec<User>,
    pub skipped: Vec<SkippedRow>,
    pub blank_rows: usize,
}

/// Import every data row of the first worksheet in `bytes`.
///
/// The format (xlsx, xlsm, xls, ods) is detected from the content.
pub async fn import_workbook(
    store: &dyn UserStore,
    bytes: Vec<u8>,
) -> Result<ImportOutcome, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Unreadable("workbook has no worksheets".to_string()))?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let report = parse_range(&range);
    tracing::debug!(
        accepted = report.users.len(),
        skipped = report.skipped.len(),
        blank = report.blank_rows,
        "Parsed uploaded worksheet",
    );

    if report.is_empty() {
        return Err(ImportError::NoValidRows {
            skipped: report.skipped,
        });
    }

    let users = store.create_many(report.users).await?;
    tracing::info!(count = users.len(), skipped = report.skipped.len(), "Imported users");

    Ok(ImportOutcome {
        users,
        skipped: report.skipped,
        blank_rows: report.blank_rows,
    })
}
