//! Durable repositories.
//!
//! Each repository wraps a cloneable cloud client and implements one of the
//! [`crate::store`] traits.

pub mod session_repo;
pub mod user_repo;
pub mod warehouse_repo;

pub use session_repo::DatastoreSessionRepo;
pub use user_repo::DatastoreUserRepo;
pub use warehouse_repo::BigQueryWarehouse;
