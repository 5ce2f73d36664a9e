//! Pure domain types and logic for the user service.
//!
//! Nothing in this crate performs I/O: the record stores, cloud clients and
//! HTTP layer live in sibling crates and depend on the types defined here.

pub mod error;
pub mod importer;
pub mod migration;
pub mod session;
pub mod types;
pub mod user;
