//! Storage traits shared by the durable and volatile backends.
//!
//! Handlers and pipelines hold these as `Arc<dyn ...>` so the backend can
//! be chosen at startup.

use async_trait::async_trait;
use userhub_core::migration::WarehouseRow;
use userhub_core::session::Session;
use userhub_core::types::DbId;
use userhub_core::user::{NewUser, User, UserResponse};

use crate::StoreResult;

/// Persistence for user profile records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new record and return it with its assigned id.
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Persist a batch in one round trip where the backend allows it.
    /// Returned records keep the input order.
    async fn create_many(&self, users: Vec<NewUser>) -> StoreResult<Vec<User>>;

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    /// First record whose email equals `email` exactly. Emails are not
    /// unique; which duplicate wins is backend order.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Every record.
    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Replace the profile fields of an existing record. `None` if absent.
    async fn update(&self, id: DbId, profile: NewUser) -> StoreResult<Option<User>>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, id: DbId) -> StoreResult<bool>;

    /// Records whose name contains `needle`, case-insensitively.
    async fn search_by_name(&self, needle: &str) -> StoreResult<Vec<User>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|u| u.name_contains(needle))
            .collect())
    }
}

/// Persistence for login sessions, keyed by token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write a session, overwriting any record with the same token.
    async fn put(&self, session: &Session) -> StoreResult<()>;

    /// Raw read. Expiry is not checked here.
    async fn get(&self, id: &str) -> StoreResult<Option<Session>>;

    /// Remove a session. Removing a missing token succeeds.
    async fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Dataset and table a warehouse writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTarget {
    pub dataset: String,
    pub table: String,
}

/// Outcome of a multi-row insert. Rows not listed were accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Zero-based positions of the rejected rows.
    pub failed_rows: Vec<usize>,
}

impl InsertReport {
    pub fn failed_count(&self) -> usize {
        self.failed_rows.len()
    }
}

/// Analytical table the migration copies users into.
#[async_trait]
pub trait Warehouse: Send + Sync {
    fn target(&self) -> &WarehouseTarget;

    /// Create the dataset if it does not exist yet.
    async fn ensure_dataset(&self) -> StoreResult<()>;

    /// Create the user table with the fixed schema if it does not exist yet.
    async fn ensure_table(&self) -> StoreResult<()>;

    async fn table_exists(&self) -> StoreResult<bool>;

    /// Submit every row in one insert. Individual rejections are reported,
    /// not raised.
    async fn insert_rows(&self, rows: &[WarehouseRow]) -> StoreResult<InsertReport>;

    /// Read back up to `limit` users, ordered by id. Passwords are never
    /// selected.
    async fn query_users(&self, limit: u32) -> StoreResult<Vec<UserResponse>>;
}
