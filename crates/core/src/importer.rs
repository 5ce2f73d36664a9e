//! Spreadsheet-to-user row mapping for the bulk upload importer.
//!
//! This module has no I/O. It works on an already-decoded [`calamine`] cell
//! range and produces one [`RowOutcome`] per data row:
//!
//! - The first row of the sheet is a header and is always skipped.
//! - Rows where every cell is empty or zero-length text are dropped silently.
//! - Columns 0-6 map to name, date of birth, email, password, phone,
//!   gender and address.
//! - An unparseable date of birth becomes `None`; the row is still kept.
//! - A text column holding a spreadsheet error value skips that row only.

use calamine::{Data, Range};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::user::{NewUser, ISO_DATE_FORMAT};

// ── Column layout ────────────────────────────────────────────────────

pub const COL_NAME: u32 = 0;
pub const COL_DATE_OF_BIRTH: u32 = 1;
pub const COL_EMAIL: u32 = 2;
pub const COL_PASSWORD: u32 = 3;
pub const COL_PHONE: u32 = 4;
pub const COL_GENDER: u32 = 5;
pub const COL_ADDRESS: u32 = 6;

/// Number of mapped columns.
pub const COLUMN_COUNT: u32 = 7;

// ── Types ────────────────────────────────────────────────────────────

/// What happened to a single spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row produced a user record.
    Imported(NewUser),
    /// Every cell in the row was empty.
    Blank,
    /// The row could not be mapped; the batch continues without it.
    Skipped(String),
}

/// A row rejected during import, reported back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based row number as shown by spreadsheet applications.
    pub row: u32,
    pub reason: String,
}

/// Aggregate result of parsing one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub users: Vec<NewUser>,
    pub skipped: Vec<SkippedRow>,
    pub blank_rows: usize,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ── Pure Functions ───────────────────────────────────────────────────

/// Parse every data row of `range` (header excluded).
pub fn parse_range(range: &Range<Data>) -> ImportReport {
    let mut report = ImportReport::default();

    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return report;
    };

    // The first row of the used range is the header.
    let last_col = end.1.max(COLUMN_COUNT - 1);
    for row in (start.0 + 1)..=end.0 {
        let cells: Vec<Option<&Data>> = (0..=last_col)
            .map(|col| range.get_value((row, col)))
            .collect();

        match parse_row(&cells) {
            RowOutcome::Imported(user) => report.users.push(user),
            RowOutcome::Blank => report.blank_rows += 1,
            RowOutcome::Skipped(reason) => report.skipped.push(SkippedRow {
                row: row + 1,
                reason,
            }),
        }
    }

    report
}

/// Map one row's cells (indexed by column position) to a user record.
///
/// Blankness is judged over every cell passed in, including those past the
/// mapped columns.
pub fn parse_row(cells: &[Option<&Data>]) -> RowOutcome {
    if cells.iter().all(|c| is_blank(*c)) {
        return RowOutcome::Blank;
    }

    let cell = |col: u32| cells.get(col as usize).copied().flatten();
    let text = |col: u32, field: &str| {
        cell_text(cell(col)).map_err(|e| format!("{field}: {e}"))
    };

    let mapped = (|| -> Result<NewUser, String> {
        Ok(NewUser {
            name: text(COL_NAME, "name")?,
            date_of_birth: cell_date(cell(COL_DATE_OF_BIRTH)),
            email: text(COL_EMAIL, "email")?,
            password: text(COL_PASSWORD, "password")?,
            phone: text(COL_PHONE, "phone")?,
            gender: text(COL_GENDER, "gender")?,
            address: text(COL_ADDRESS, "address")?,
        })
    })();

    match mapped {
        Ok(user) => RowOutcome::Imported(user),
        Err(reason) => RowOutcome::Skipped(reason),
    }
}

/// A cell counts as blank when it is missing, empty, or zero-length text.
/// Whitespace is content.
pub fn is_blank(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Render a cell as text for a string column.
///
/// Floats are truncated toward zero so phone numbers typed as numbers keep
/// their digits without a trailing `.0`.
pub fn cell_text(cell: Option<&Data>) -> Result<String, String> {
    match cell {
        None | Some(Data::Empty) => Ok(String::new()),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => {
            Ok(s.trim().to_string())
        }
        Some(Data::Int(i)) => Ok(i.to_string()),
        Some(Data::Float(f)) => Ok((f.trunc() as i64).to_string()),
        Some(Data::Bool(b)) => Ok(b.to_string()),
        Some(Data::DateTime(dt)) => Ok(dt
            .as_datetime()
            .map(render_datetime)
            .unwrap_or_else(|| dt.as_f64().to_string())),
        Some(Data::Error(e)) => Err(format!("cell holds error value {e}")),
    }
}

/// Read a date-of-birth cell. Anything that is neither a native date nor
/// ISO `YYYY-MM-DD` text yields `None`.
pub fn cell_date(cell: Option<&Data>) -> Option<NaiveDate> {
    match cell? {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::String(s) => NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT).ok(),
        Data::DateTimeIso(s) => parse_iso_date_or_datetime(s.trim()),
        _ => None,
    }
}

fn parse_iso_date_or_datetime(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.date())
        })
}

fn render_datetime(value: NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.date().format(ISO_DATE_FORMAT).to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
