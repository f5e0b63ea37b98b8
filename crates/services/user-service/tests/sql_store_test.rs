//! SQL document store tests against a temporary SQLite database.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use common::{AppError, DatabaseConfig};
use domain::{FilterOptions, Gender, SortField, SortOrder, UserFormData};
use user_service_lib::infra::{Database, SqlDocumentStore};
use user_service_lib::service::{UserManager, UserService};
use user_service_lib::store::{
    Direction, DocumentStore, FieldFilter, FieldValue, Fields, MemoryObjectStore, Query,
};

struct TestDb {
    db: Database,
    _dir: TempDir,
}

async fn test_db() -> TestDb {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("users.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: 1,
        min_connections: 1,
    };

    let db = Database::connect(&config).await.expect("connect sqlite");
    TestDb { db, _dir: dir }
}

fn fields(name: &str, gender: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), FieldValue::from(name));
    fields.insert("gender".to_string(), FieldValue::from(gender));
    fields.insert(
        "createdAt".to_string(),
        FieldValue::from(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
    );
    fields
}

#[tokio::test]
async fn test_add_and_get() {
    let t = test_db().await;
    let store = SqlDocumentStore::new(t.db.get_connection());

    let id = store.add("users", fields("Alice", "female")).await.unwrap();
    let doc = store.get("users", &id).await.unwrap().expect("document");

    assert_eq!(doc.id, id);
    assert_eq!(doc.fields, fields("Alice", "female"));
    assert!(store.get("admins", &id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_merges_and_reports_missing() {
    let t = test_db().await;
    let store = SqlDocumentStore::new(t.db.get_connection());
    let id = store.add("users", fields("Alice", "female")).await.unwrap();

    let mut patch = Fields::new();
    patch.insert("name".to_string(), FieldValue::from("Alicia"));
    assert_ok!(store.update("users", &id, patch.clone()).await);

    let doc = store.get("users", &id).await.unwrap().unwrap();
    assert_eq!(doc.get("name"), Some(&FieldValue::from("Alicia")));
    assert_eq!(doc.get("gender"), Some(&FieldValue::from("female")));
    assert!(doc.get("createdAt").is_some());

    let missing = store.update("users", "missing", patch).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let t = test_db().await;
    let store = SqlDocumentStore::new(t.db.get_connection());
    let id = store.add("users", fields("Alice", "female")).await.unwrap();

    assert_ok!(store.delete("users", &id).await);
    assert_ok!(store.delete("users", &id).await);
    assert!(store.get("users", &id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_query_filters_and_orders() {
    let t = test_db().await;
    let store = SqlDocumentStore::new(t.db.get_connection());
    for (name, gender) in [("Alice", "female"), ("Bob", "male"), ("Alan", "male")] {
        store.add("users", fields(name, gender)).await.unwrap();
    }
    store.add("admins", fields("Albert", "male")).await.unwrap();

    let query = Query::new()
        .filter(FieldFilter::gte("name", "Al"))
        .filter(FieldFilter::lte("name", "Al\u{f8ff}"))
        .order_by("name", Direction::Descending);
    let docs = store.query("users", &query).await.unwrap();

    let names: Vec<_> = docs
        .iter()
        .filter_map(|d| d.get("name").and_then(FieldValue::as_str))
        .collect();
    assert_eq!(names, vec!["Alice", "Alan"]);
}

#[tokio::test]
async fn test_service_round_trip_over_sql() {
    let t = test_db().await;
    let service = UserManager::new(
        Arc::new(SqlDocumentStore::new(t.db.get_connection())),
        Arc::new(MemoryObjectStore::new("test")),
    );

    let id = service
        .add_user(UserFormData::new("Alice", "alice@example.com", "1990-04-01", Gender::Female))
        .await
        .unwrap();
    service
        .add_user(UserFormData::new("Bob", "bob@example.com", "1985-12-24", Gender::Male))
        .await
        .unwrap();

    let users = service
        .get_users(Some(SortField::Dob), SortOrder::Asc, &FilterOptions::default())
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "Bob");
    assert_eq!(users[1].id, id);
    assert_eq!(users[1].dob, "1990-04-01");

    assert_ok!(service.delete_user(&id, None).await);
    assert_err!(service.get_user(&id).await);
}

#[tokio::test]
async fn test_migration_status_lists_applied_migrations() {
    let t = test_db().await;

    let status = t.db.migration_status().await.unwrap();

    assert!(!status.is_empty());
    assert!(status.iter().all(|(_, applied)| *applied));
    assert_ok!(t.db.ping().await);
}
