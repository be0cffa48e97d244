//! `PgStore` tests against a real database.
//!
//! These tests require:
//! - A running `PostgreSQL` database reachable via `DATABASE_URL`
//! - Migrations applied (`cargo run -p storesync-cli -- migrate`)
//!
//! Run with: `cargo test -p storesync-integration-tests -- --ignored`

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use storesync_core::{RemoteId, UserId};
use storesync_server::db::{PgStore, SyncStore, create_pool};
use storesync_server::models::{CustomerUpsert, NewTenant, OrderUpsert, Tenant};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    PgStore::new(pool)
}

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Remote ids are globally unique, so every call yields a fresh one.
fn unique(tag: &str) -> RemoteId {
    let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RemoteId::new(format!("it-{tag}-{}-{n}", Utc::now().timestamp_micros()))
}

async fn tenant(store: &PgStore) -> Tenant {
    store
        .create_tenant(
            UserId::new(1),
            NewTenant {
                name: "Integration".to_string(),
                store_url: "https://integration.myshopify.com".to_string(),
                api_token: SecretString::from("shpat_test"),
            },
        )
        .await
        .expect("Failed to create tenant")
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_customer_upsert_is_keyed_by_remote_id() {
    let store = store().await;
    let tenant = tenant(&store).await;
    let remote_id = unique("customer");

    let first = store
        .upsert_customer(
            tenant.id,
            &CustomerUpsert::from_remote(
                remote_id.clone(),
                Some("Ada".to_string()),
                Some("ada@example.com".to_string()),
            ),
        )
        .await
        .expect("first upsert");
    let second = store
        .upsert_customer(
            tenant.id,
            &CustomerUpsert::from_remote(remote_id.clone(), Some("Adaline".to_string()), None),
        )
        .await
        .expect("second upsert");

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Adaline");
    assert_eq!(second.email, "ada@example.com");
    assert_eq!(store.count_customers(tenant.id).await.expect("count"), 1);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_order_aggregates() {
    let store = store().await;
    let tenant = tenant(&store).await;

    assert_eq!(store.total_revenue(tenant.id).await.expect("revenue"), Decimal::ZERO);

    let guest = store
        .upsert_customer(tenant.id, &CustomerUpsert::guest_for_order(&unique("order")))
        .await
        .expect("guest");
    let placed = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).single().expect("valid date");
    for total in [Decimal::new(1000, 2), Decimal::new(250, 2)] {
        store
            .upsert_order(
                tenant.id,
                &OrderUpsert {
                    remote_id: unique("order"),
                    total,
                    created_at: placed,
                    customer_id: Some(guest.id),
                },
            )
            .await
            .expect("order upsert");
    }

    assert_eq!(store.count_orders(tenant.id).await.expect("count"), 2);
    assert_eq!(
        store.total_revenue(tenant.id).await.expect("revenue"),
        Decimal::new(1250, 2)
    );
    let spend = store.customer_spend(tenant.id).await.expect("spend");
    assert_eq!(spend.len(), 1);
    assert_eq!(spend.first().map(|s| s.spend), Some(Decimal::new(1250, 2)));
}
