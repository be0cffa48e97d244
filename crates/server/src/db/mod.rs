//! Store repository for tenants and reconciled entities.
//!
//! # Tables
//!
//! - `tenants` - Registered remote stores, owned by a user
//! - `customers` - Reconciled customers (unique `remote_id`)
//! - `products` - Reconciled products (unique `remote_id`)
//! - `orders` - Reconciled orders (unique `remote_id`, optional customer)
//!
//! # Implementations
//!
//! - [`PgStore`] - `PostgreSQL` via sqlx runtime queries
//! - [`MemoryStore`] - In-process store for tests and local development
//!
//! # Migrations
//!
//! The schema lives in `crates/server/migrations/` and is applied via:
//! ```bash
//! cargo run -p storesync-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use storesync_core::{RemoteId, TenantId, UserId};
use thiserror::Error;

use crate::config::StoreBackend;
use crate::models::{
    Customer, CustomerSpend, CustomerUpsert, NewTenant, Order, OrderUpsert, Product,
    ProductUpsert, Tenant,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Repository interface consumed by the sync engine and the HTTP layer.
///
/// Every upsert is a single atomic create-or-update keyed by the entity's
/// unique remote identity, so concurrent upserts of the same record are safe
/// (last write wins). Reads are scoped by tenant.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Register a tenant owned by `owner`.
    async fn create_tenant(&self, owner: UserId, tenant: NewTenant)
    -> Result<Tenant, RepositoryError>;

    /// All tenants owned by `owner`, oldest first.
    async fn list_tenants(&self, owner: UserId) -> Result<Vec<Tenant>, RepositoryError>;

    /// A tenant, only if it is owned by `owner`.
    async fn find_tenant(
        &self,
        id: TenantId,
        owner: UserId,
    ) -> Result<Option<Tenant>, RepositoryError>;

    /// Create or update a customer by remote identity.
    async fn upsert_customer(
        &self,
        tenant: TenantId,
        upsert: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError>;

    /// Look up a customer by remote identity.
    async fn find_customer_by_remote_id(
        &self,
        remote_id: &RemoteId,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Create or update a product by remote identity.
    async fn upsert_product(
        &self,
        tenant: TenantId,
        upsert: &ProductUpsert,
    ) -> Result<Product, RepositoryError>;

    /// Create or update an order by remote identity.
    async fn upsert_order(
        &self,
        tenant: TenantId,
        upsert: &OrderUpsert,
    ) -> Result<Order, RepositoryError>;

    /// Number of customers (guests included) of a tenant.
    async fn count_customers(&self, tenant: TenantId) -> Result<i64, RepositoryError>;

    /// Number of orders of a tenant.
    async fn count_orders(&self, tenant: TenantId) -> Result<i64, RepositoryError>;

    /// Sum of all order totals of a tenant; zero when there are none.
    async fn total_revenue(&self, tenant: TenantId) -> Result<Decimal, RepositoryError>;

    /// Every customer of a tenant with their summed order totals, in
    /// ascending customer-id order.
    async fn customer_spend(&self, tenant: TenantId)
    -> Result<Vec<CustomerSpend>, RepositoryError>;

    /// Orders of a tenant placed within `[from, to]`, oldest first.
    async fn orders_between(
        &self,
        tenant: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build the configured store backend.
///
/// # Errors
///
/// Returns `sqlx::Error` if the `PostgreSQL` pool cannot be created.
pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn SyncStore>, sqlx::Error> {
    match backend {
        StoreBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
