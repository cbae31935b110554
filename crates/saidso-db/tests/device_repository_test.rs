//! Integration tests for the Device repository using in-memory
//! SurrealDB.

use saidso_core::models::device::UpsertDevice;
use saidso_core::repository::DeviceRepository;
use saidso_db::repository::SurrealDeviceRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    saidso_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn upsert_creates_then_updates_single_row() {
    let db = setup().await;
    let repo = SurrealDeviceRepository::new(db);
    let user_id = Uuid::new_v4();

    let input = UpsertDevice {
        user_id,
        ip_address: "203.0.113.7".into(),
        device_class: "Windows PC".into(),
    };

    repo.upsert(input.clone()).await.unwrap();
    let after_first = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(after_first.len(), 1);
    let first_seen = after_first[0].last_active_at;

    // Second login from the same (user, ip, class) refreshes the row
    // instead of creating another.
    repo.upsert(input).await.unwrap();
    let after_second = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(after_second.len(), 1);
    assert!(after_second[0].last_active_at >= first_seen);
}

#[tokio::test]
async fn distinct_devices_get_distinct_rows() {
    let db = setup().await;
    let repo = SurrealDeviceRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.upsert(UpsertDevice {
        user_id,
        ip_address: "203.0.113.7".into(),
        device_class: "Windows PC".into(),
    })
    .await
    .unwrap();
    repo.upsert(UpsertDevice {
        user_id,
        ip_address: "203.0.113.7".into(),
        device_class: "iPhone".into(),
    })
    .await
    .unwrap();
    repo.upsert(UpsertDevice {
        user_id,
        ip_address: "198.51.100.4".into(),
        device_class: "Windows PC".into(),
    })
    .await
    .unwrap();

    let records = repo.list_for_user(user_id).await.unwrap();
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn listing_is_scoped_to_user() {
    let db = setup().await;
    let repo = SurrealDeviceRepository::new(db);
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    repo.upsert(UpsertDevice {
        user_id: user_a,
        ip_address: "203.0.113.7".into(),
        device_class: "Mac".into(),
    })
    .await
    .unwrap();

    assert_eq!(repo.list_for_user(user_a).await.unwrap().len(), 1);
    assert!(repo.list_for_user(user_b).await.unwrap().is_empty());
}
