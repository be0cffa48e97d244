//! `PostgreSQL` implementation of [`SyncStore`].
//!
//! Uses runtime queries to avoid `SQLx` offline mode cache requirements.
//! Upserts map directly onto `INSERT ... ON CONFLICT (remote_id)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use storesync_core::{CustomerId, OrderId, ProductId, RemoteId, TenantId, UserId};
use tracing::instrument;

use super::{RepositoryError, SyncStore};
use crate::models::{
    Customer, CustomerSpend, CustomerUpsert, NewTenant, Order, OrderUpsert, Product,
    ProductUpsert, Tenant,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: TenantId,
    user_id: UserId,
    name: String,
    store_url: String,
    api_token: String,
    created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            store_url: row.store_url,
            api_token: SecretString::from(row.api_token),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    tenant_id: TenantId,
    remote_id: RemoteId,
    name: String,
    email: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            remote_id: row.remote_id,
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    tenant_id: TenantId,
    remote_id: RemoteId,
    title: String,
    price: Decimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            remote_id: row.remote_id,
            title: row.title,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    tenant_id: TenantId,
    remote_id: RemoteId,
    total: Decimal,
    created_at: DateTime<Utc>,
    customer_id: Option<CustomerId>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            remote_id: row.remote_id,
            total: row.total,
            created_at: row.created_at,
            customer_id: row.customer_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerSpendRow {
    id: CustomerId,
    name: String,
    spend: Decimal,
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SyncStore for PgStore {
    #[instrument(skip(self, tenant), fields(owner = %owner, name = %tenant.name))]
    async fn create_tenant(
        &self,
        owner: UserId,
        tenant: NewTenant,
    ) -> Result<Tenant, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(
            r"
            INSERT INTO tenants (user_id, name, store_url, api_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, store_url, api_token, created_at
            ",
        )
        .bind(owner)
        .bind(&tenant.name)
        .bind(&tenant.store_url)
        .bind(tenant.api_token.expose_secret())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_tenants(&self, owner: UserId) -> Result<Vec<Tenant>, RepositoryError> {
        let rows = sqlx::query_as::<_, TenantRow>(
            r"
            SELECT id, user_id, name, store_url, api_token, created_at
            FROM tenants
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn find_tenant(
        &self,
        id: TenantId,
        owner: UserId,
    ) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(
            r"
            SELECT id, user_id, name, store_url, api_token, created_at
            FROM tenants
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tenant::from))
    }

    async fn upsert_customer(
        &self,
        tenant: TenantId,
        upsert: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customers (tenant_id, remote_id, name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (remote_id) DO UPDATE SET
                name = COALESCE($5, customers.name),
                email = COALESCE($6, customers.email),
                synced_at = NOW()
            RETURNING id, tenant_id, remote_id, name, email
            ",
        )
        .bind(tenant)
        .bind(&upsert.remote_id)
        .bind(&upsert.create.name)
        .bind(&upsert.create.email)
        .bind(upsert.update.name.as_deref())
        .bind(upsert.update.email.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_customer_by_remote_id(
        &self,
        remote_id: &RemoteId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, tenant_id, remote_id, name, email
            FROM customers
            WHERE remote_id = $1
            ",
        )
        .bind(remote_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn upsert_product(
        &self,
        tenant: TenantId,
        upsert: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (tenant_id, remote_id, title, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (remote_id) DO UPDATE SET
                title = EXCLUDED.title,
                price = EXCLUDED.price,
                synced_at = NOW()
            RETURNING id, tenant_id, remote_id, title, price
            ",
        )
        .bind(tenant)
        .bind(&upsert.remote_id)
        .bind(&upsert.title)
        .bind(upsert.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn upsert_order(
        &self,
        tenant: TenantId,
        upsert: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (tenant_id, remote_id, total, created_at, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (remote_id) DO UPDATE SET
                total = EXCLUDED.total,
                created_at = EXCLUDED.created_at,
                customer_id = EXCLUDED.customer_id,
                synced_at = NOW()
            RETURNING id, tenant_id, remote_id, total, created_at, customer_id
            ",
        )
        .bind(tenant)
        .bind(&upsert.remote_id)
        .bind(upsert.total)
        .bind(upsert.created_at)
        .bind(upsert.customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn count_customers(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE tenant_id = $1")
                .bind(tenant)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_orders(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE tenant_id = $1")
                .bind(tenant)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn total_revenue(&self, tenant: TenantId) -> Result<Decimal, RepositoryError> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total), 0) FROM orders WHERE tenant_id = $1",
        )
        .bind(tenant)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn customer_spend(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<CustomerSpend>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerSpendRow>(
            r"
            SELECT c.id, c.name, COALESCE(SUM(o.total), 0) AS spend
            FROM customers c
            LEFT JOIN orders o ON o.customer_id = c.id
            WHERE c.tenant_id = $1
            GROUP BY c.id, c.name
            ORDER BY c.id
            ",
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CustomerSpend {
                customer_id: r.id,
                name: r.name,
                spend: r.spend,
            })
            .collect())
    }

    async fn orders_between(
        &self,
        tenant: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, tenant_id, remote_id, total, created_at, customer_id
            FROM orders
            WHERE tenant_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC
            ",
        )
        .bind(tenant)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
