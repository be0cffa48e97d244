//! Sync behavior when the remote shop or the local store misbehaves.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use storesync_core::{RemoteId, TenantId, UserId};
use storesync_integration_tests::{TestContext, collection_path};
use storesync_server::db::{MemoryStore, RepositoryError, SyncStore};
use storesync_server::models::{
    Customer, CustomerSpend, CustomerUpsert, NewTenant, Order, OrderUpsert, Product,
    ProductUpsert, Tenant,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const OWNER: UserId = UserId::new(42);

async fn fail_customers(ctx: &TestContext, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(collection_path("customers")))
        .respond_with(ResponseTemplate::new(status))
        .up_to_n_times(times)
        .with_priority(1)
        .expect(times)
        .mount(&ctx.shop)
        .await;
}

// ============================================================================
// Remote Failures
// ============================================================================

#[tokio::test]
async fn test_rejected_token_is_not_retried() {
    let ctx = TestContext::new().await;
    let tenant = ctx.register_tenant(OWNER, "Demo").await;
    fail_customers(&ctx, 401, 1).await;
    ctx.mount_shop(json!([]), json!([]), json!([])).await;

    let (status, body) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Sync failed"}));
    ctx.shop.verify().await;
}

#[tokio::test]
async fn test_unavailable_shop_is_retried_then_fails() {
    let ctx = TestContext::new().await;
    let tenant = ctx.register_tenant(OWNER, "Demo").await;
    // Matches every attempt; the default options allow two.
    Mock::given(method("GET"))
        .and(path(collection_path("customers")))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&ctx.shop)
        .await;

    let (status, body) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Sync failed"}));
    ctx.shop.verify().await;
    assert!(ctx.store.customers(tenant.id).await.is_empty());
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let ctx = TestContext::new().await;
    let tenant = ctx.register_tenant(OWNER, "Demo").await;
    fail_customers(&ctx, 429, 1).await;
    ctx.mount_shop(
        json!([{"id": 1, "first_name": "Ada", "email": "ada@example.com"}]),
        json!([]),
        json!([]),
    )
    .await;

    let (status, body) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCustomers"], 1);
    ctx.shop.verify().await;
}

#[tokio::test]
async fn test_malformed_payload_fails_sync() {
    let ctx = TestContext::new().await;
    let tenant = ctx.register_tenant(OWNER, "Demo").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&ctx.shop)
        .await;

    let (status, _) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Store Failures
// ============================================================================

/// Delegates to a [`MemoryStore`] but refuses to write orders.
struct RejectOrders {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl SyncStore for RejectOrders {
    async fn create_tenant(
        &self,
        owner: UserId,
        tenant: NewTenant,
    ) -> Result<Tenant, RepositoryError> {
        self.inner.create_tenant(owner, tenant).await
    }

    async fn list_tenants(&self, owner: UserId) -> Result<Vec<Tenant>, RepositoryError> {
        self.inner.list_tenants(owner).await
    }

    async fn find_tenant(
        &self,
        id: TenantId,
        owner: UserId,
    ) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.find_tenant(id, owner).await
    }

    async fn upsert_customer(
        &self,
        tenant: TenantId,
        upsert: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        self.inner.upsert_customer(tenant, upsert).await
    }

    async fn find_customer_by_remote_id(
        &self,
        remote_id: &RemoteId,
    ) -> Result<Option<Customer>, RepositoryError> {
        self.inner.find_customer_by_remote_id(remote_id).await
    }

    async fn upsert_product(
        &self,
        tenant: TenantId,
        upsert: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        self.inner.upsert_product(tenant, upsert).await
    }

    async fn upsert_order(
        &self,
        _tenant: TenantId,
        _upsert: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        Err(RepositoryError::Conflict("orders are read-only".to_string()))
    }

    async fn count_customers(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        self.inner.count_customers(tenant).await
    }

    async fn count_orders(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        self.inner.count_orders(tenant).await
    }

    async fn total_revenue(&self, tenant: TenantId) -> Result<Decimal, RepositoryError> {
        self.inner.total_revenue(tenant).await
    }

    async fn customer_spend(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<CustomerSpend>, RepositoryError> {
        self.inner.customer_spend(tenant).await
    }

    async fn orders_between(
        &self,
        tenant: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.inner.orders_between(tenant, from, to).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.inner.ping().await
    }
}

#[tokio::test]
async fn test_store_failure_fails_sync_and_keeps_earlier_writes() {
    let ctx = TestContext::with_store(|inner| Arc::new(RejectOrders { inner })).await;
    let tenant = ctx.register_tenant(OWNER, "Demo").await;
    ctx.mount_shop(
        json!([{"id": 1, "first_name": "Ada", "email": "ada@example.com"}]),
        json!([{"id": 10, "title": "Mug", "variants": [{"price": "12.50"}]}]),
        json!([{"id": 100, "total_price": "30.00", "created_at": "2024-01-01T10:00:00Z", "customer": {"id": 1}}]),
    )
    .await;

    let (status, body) = ctx.get(&format!("/sync/{}", tenant.id), Some(OWNER)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Sync failed"}));
    assert_eq!(ctx.store.customers(tenant.id).await.len(), 1);
    assert_eq!(ctx.store.products(tenant.id).await.len(), 1);
    assert!(ctx.store.orders(tenant.id).await.is_empty());
}
