//! Behaviour of the volatile store implementations.
//!
//! These are the stores every API test runs against, so they must honour the
//! same contracts as the Datastore and BigQuery repositories:
//! - ids are assigned on create and never change
//! - email lookup returns the first match (lowest id)
//! - deleting a missing record reports `false`
//! - session reads do not apply expiry
//! - warehouse inserts report per-row rejections without failing

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use userhub_core::migration::to_warehouse_rows;
use userhub_core::session::Session;
use userhub_core::user::NewUser;
use userhub_db::memory::{MemorySessionStore, MemoryUserStore, MemoryWarehouse};
use userhub_db::{SessionStore, StoreError, UserStore, Warehouse, WarehouseTarget};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "pw".to_string(),
        ..Default::default()
    }
}

fn target() -> WarehouseTarget {
    WarehouseTarget {
        dataset: "user_data".to_string(),
        table: "User".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_assigns_sequential_ids() {
    let store = MemoryUserStore::new();
    let ann = store.create(new_user("Ann", "ann@x.com")).await.unwrap();
    let bob = store.create(new_user("Bob", "bob@x.com")).await.unwrap();

    assert_eq!(ann.id, 1);
    assert_eq!(bob.id, 2);
    assert_eq!(store.find_by_id(2).await.unwrap(), Some(bob));
}

#[tokio::test]
async fn create_many_keeps_input_order() {
    let store = MemoryUserStore::new();
    let created = store
        .create_many(vec![new_user("A", "a@x.com"), new_user("B", "b@x.com")])
        .await
        .unwrap();

    let names: Vec<_> = created.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
    assert_eq!(store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_email_lookup_returns_lowest_id() {
    let store = MemoryUserStore::new();
    let first = store.create(new_user("First", "dup@x.com")).await.unwrap();
    store.create(new_user("Second", "dup@x.com")).await.unwrap();

    let found = store.find_by_email("dup@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
    assert_eq!(found.name, "First");
}

#[tokio::test]
async fn email_lookup_is_exact() {
    let store = MemoryUserStore::new();
    store.create(new_user("Ann", "ann@x.com")).await.unwrap();

    assert!(store.find_by_email("ANN@x.com").await.unwrap().is_none());
    assert!(store.find_by_email("").await.unwrap().is_none());
}

#[tokio::test]
async fn update_replaces_profile_and_keeps_id() {
    let store = MemoryUserStore::new();
    let ann = store.create(new_user("Ann", "ann@x.com")).await.unwrap();

    let mut profile = new_user("Ann B", "annb@x.com");
    profile.date_of_birth = NaiveDate::from_ymd_opt(1990, 1, 15);
    let updated = store.update(ann.id, profile).await.unwrap().unwrap();

    assert_eq!(updated.id, ann.id);
    assert_eq!(updated.email, "annb@x.com");
    assert_eq!(store.find_by_id(ann.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn update_missing_user_is_none() {
    let store = MemoryUserStore::new();
    assert!(store.update(99, new_user("X", "x@x.com")).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_record_was_removed() {
    let store = MemoryUserStore::new();
    let ann = store.create(new_user("Ann", "ann@x.com")).await.unwrap();

    assert!(store.delete(ann.id).await.unwrap());
    assert!(!store.delete(ann.id).await.unwrap());
    assert!(!store.delete(12345).await.unwrap());
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
    let store = MemoryUserStore::new();
    let ann = store.create(new_user("Ann", "ann@x.com")).await.unwrap();
    store.delete(ann.id).await.unwrap();

    let bob = store.create(new_user("Bob", "bob@x.com")).await.unwrap();
    assert_ne!(bob.id, ann.id);
}

#[tokio::test]
async fn search_by_name_is_case_insensitive() {
    let store = MemoryUserStore::new();
    store.create(new_user("Annabel", "a@x.com")).await.unwrap();
    store.create(new_user("Bob", "b@x.com")).await.unwrap();
    store.create(new_user("JOANNA", "j@x.com")).await.unwrap();

    let found = store.search_by_name("ann").await.unwrap();
    let names: Vec<_> = found.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Annabel", "JOANNA"]);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_put_get_delete() {
    let store = MemorySessionStore::new();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let session = Session::new(
        "tok".to_string(),
        1,
        "ann@x.com".to_string(),
        "Ann".to_string(),
        now,
        Duration::minutes(30),
    )
    .unwrap();

    store.put(&session).await.unwrap();
    assert_eq!(store.get("tok").await.unwrap(), Some(session));

    store.delete("tok").await.unwrap();
    assert!(store.get("tok").await.unwrap().is_none());
    assert!(store.is_empty().await);

    // Deleting again is a no-op.
    store.delete("tok").await.unwrap();
}

#[tokio::test]
async fn session_store_returns_expired_records() {
    let store = MemorySessionStore::new();
    let long_ago = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    let session = Session::new(
        "old".to_string(),
        1,
        String::new(),
        String::new(),
        long_ago,
        Duration::minutes(1),
    )
    .unwrap();
    store.put(&session).await.unwrap();

    assert!(store.get("old").await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Warehouse
// ---------------------------------------------------------------------------

#[tokio::test]
async fn warehouse_requires_table_before_insert() {
    let warehouse = MemoryWarehouse::new(target());
    let rows = to_warehouse_rows(&[new_user("Ann", "ann@x.com").with_id(1)]);

    assert_matches!(
        warehouse.insert_rows(&rows).await,
        Err(StoreError::Unavailable(_))
    );

    warehouse.ensure_dataset().await.unwrap();
    warehouse.ensure_table().await.unwrap();
    assert!(warehouse.table_exists().await.unwrap());

    let report = warehouse.insert_rows(&rows).await.unwrap();
    assert_eq!(report.failed_count(), 0);
    assert_eq!(warehouse.rows().await.len(), 1);
}

#[tokio::test]
async fn rejected_rows_are_reported_by_position() {
    let warehouse = MemoryWarehouse::new(target()).rejecting(|row| row.email.is_empty());
    warehouse.ensure_dataset().await.unwrap();
    warehouse.ensure_table().await.unwrap();

    let users = vec![
        new_user("A", "a@x.com").with_id(1),
        new_user("B", "").with_id(2),
        new_user("C", "c@x.com").with_id(3),
    ];
    let report = warehouse.insert_rows(&to_warehouse_rows(&users)).await.unwrap();

    assert_eq!(report.failed_rows, vec![1]);
    assert_eq!(warehouse.rows().await.len(), 2);
}

#[tokio::test]
async fn failing_warehouse_errors_everywhere() {
    let warehouse = MemoryWarehouse::new(target()).failing("quota exceeded");

    assert_matches!(warehouse.ensure_dataset().await, Err(StoreError::Unavailable(m)) if m == "quota exceeded");
    assert_matches!(warehouse.table_exists().await, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn query_users_orders_by_id_and_respects_limit() {
    let warehouse = MemoryWarehouse::new(target());
    warehouse.ensure_dataset().await.unwrap();
    warehouse.ensure_table().await.unwrap();

    let mut ann = new_user("Ann", "ann@x.com");
    ann.date_of_birth = NaiveDate::from_ymd_opt(1990, 1, 15);
    let users = vec![
        new_user("C", "c@x.com").with_id(3),
        ann.with_id(1),
        new_user("B", "b@x.com").with_id(2),
    ];
    warehouse.insert_rows(&to_warehouse_rows(&users)).await.unwrap();

    let read = warehouse.query_users(2).await.unwrap();
    let ids: Vec<_> = read.iter().map(|u| u.id).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(read[0].date_of_birth, NaiveDate::from_ymd_opt(1990, 1, 15));
}
