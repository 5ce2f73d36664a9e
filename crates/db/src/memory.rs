//! Volatile store implementations.
//!
//! Each store keeps its state in a map behind a `tokio::sync::Mutex`, held
//! for exactly one operation. Contents are lost on restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use userhub_core::migration::WarehouseRow;
use userhub_core::session::Session;
use userhub_core::types::DbId;
use userhub_core::user::{NewUser, User, UserResponse, ISO_DATE_FORMAT};

use crate::store::{InsertReport, SessionStore, UserStore, Warehouse, WarehouseTarget};
use crate::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct UserTable {
    next_id: DbId,
    rows: BTreeMap<DbId, User>,
}

/// Users keyed by a sequential id starting at 1. Iteration is in id order,
/// so the first email match is the lowest id.
#[derive(Debug)]
pub struct MemoryUserStore {
    table: Mutex<UserTable>,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self {
            table: Mutex::new(UserTable {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.table.lock().await;
        let id = table.next_id;
        table.next_id += 1;
        let user = user.with_id(id);
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn create_many(&self, users: Vec<NewUser>) -> StoreResult<Vec<User>> {
        let mut table = self.table.lock().await;
        let mut created = Vec::with_capacity(users.len());
        for user in users {
            let id = table.next_id;
            table.next_id += 1;
            let user = user.with_id(id);
            table.rows.insert(id, user.clone());
            created.push(user);
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let table = self.table.lock().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.table.lock().await.rows.values().cloned().collect())
    }

    async fn update(&self, id: DbId, profile: NewUser) -> StoreResult<Option<User>> {
        let mut table = self.table.lock().await;
        match table.rows.get_mut(&id) {
            Some(existing) => {
                *existing = profile.with_id(id);
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: DbId) -> StoreResult<bool> {
        Ok(self.table.lock().await.rows.remove(&id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: &Session) -> StoreResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Warehouse
// ---------------------------------------------------------------------------

type RowPredicate = Box<dyn Fn(&WarehouseRow) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct WarehouseState {
    dataset_exists: bool,
    table_exists: bool,
    rows: Vec<WarehouseRow>,
}

/// In-memory warehouse table.
///
/// Failures can be injected for tests: [`MemoryWarehouse::rejecting`] makes
/// individual rows fail the insert, [`MemoryWarehouse::failing`] makes every
/// operation error out.
pub struct MemoryWarehouse {
    target: WarehouseTarget,
    state: Mutex<WarehouseState>,
    reject_when: Option<RowPredicate>,
    failure: Option<String>,
}

impl std::fmt::Debug for MemoryWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWarehouse")
            .field("target", &self.target)
            .field("rejects_rows", &self.reject_when.is_some())
            .field("failure", &self.failure)
            .finish()
    }
}

impl MemoryWarehouse {
    pub fn new(target: WarehouseTarget) -> Self {
        Self {
            target,
            state: Mutex::new(WarehouseState::default()),
            reject_when: None,
            failure: None,
        }
    }

    /// Reject every inserted row matching `predicate`.
    pub fn rejecting(
        mut self,
        predicate: impl Fn(&WarehouseRow) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.reject_when = Some(Box::new(predicate));
        self
    }

    /// Fail every operation with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Rows accepted so far.
    pub async fn rows(&self) -> Vec<WarehouseRow> {
        self.state.lock().await.rows.clone()
    }

    fn check_available(&self) -> StoreResult<()> {
        match &self.failure {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    fn target(&self) -> &WarehouseTarget {
        &self.target
    }

    async fn ensure_dataset(&self) -> StoreResult<()> {
        self.check_available()?;
        self.state.lock().await.dataset_exists = true;
        Ok(())
    }

    async fn ensure_table(&self) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.dataset_exists {
            return Err(StoreError::Unavailable(format!(
                "dataset '{}' does not exist",
                self.target.dataset
            )));
        }
        state.table_exists = true;
        Ok(())
    }

    async fn table_exists(&self) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.state.lock().await.table_exists)
    }

    async fn insert_rows(&self, rows: &[WarehouseRow]) -> StoreResult<InsertReport> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.table_exists {
            return Err(StoreError::Unavailable(format!(
                "table '{}.{}' does not exist",
                self.target.dataset, self.target.table
            )));
        }

        let mut report = InsertReport::default();
        for (index, row) in rows.iter().enumerate() {
            if self.reject_when.as_ref().is_some_and(|reject| reject(row)) {
                report.failed_rows.push(index);
            } else {
                state.rows.push(row.clone());
            }
        }
        Ok(report)
    }

    async fn query_users(&self, limit: u32) -> StoreResult<Vec<UserResponse>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut rows: Vec<&WarehouseRow> = state.rows.iter().collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|r| UserResponse {
                id: r.id,
                name: r.name.clone(),
                email: r.email.clone(),
                phone: r.phone.clone(),
                gender: r.gender.clone(),
                address: r.address.clone(),
                date_of_birth: NaiveDate::parse_from_str(&r.date_of_birth, ISO_DATE_FORMAT).ok(),
            })
            .collect())
    }
}
