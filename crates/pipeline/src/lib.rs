//! Batch pipelines that move user records in and out of the record store.
//!
//! - [`import`] -- spreadsheet upload to user records.
//! - [`migration`] -- full copy of the record store into the warehouse.

pub mod import;
pub mod migration;

pub use import::{import_workbook, ImportError, ImportOutcome};
pub use migration::{MigrationError, MigrationPipeline, MigrationPreview};
