//! In-process implementation of [`SyncStore`].
//!
//! Backs the integration tests and `STORESYNC_MEMORY_STORE=true` local runs.
//! All state sits behind one `RwLock`, so every upsert is atomic with respect
//! to other writers, mirroring the unique-constraint upserts of [`PgStore`].
//!
//! [`PgStore`]: super::PgStore

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use storesync_core::{CustomerId, OrderId, ProductId, RemoteId, TenantId, UserId};
use tokio::sync::RwLock;

use super::{RepositoryError, SyncStore};
use crate::models::{
    Customer, CustomerSpend, CustomerUpsert, NewTenant, Order, OrderUpsert, Product,
    ProductUpsert, Tenant,
};

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    tenants: BTreeMap<TenantId, Tenant>,
    customers: BTreeMap<CustomerId, Customer>,
    customers_by_remote: HashMap<RemoteId, CustomerId>,
    products: BTreeMap<ProductId, Product>,
    products_by_remote: HashMap<RemoteId, ProductId>,
    orders: BTreeMap<OrderId, Order>,
    orders_by_remote: HashMap<RemoteId, OrderId>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> Result<i32, RepositoryError> {
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| RepositoryError::Conflict("id space exhausted".to_string()))?;
        Ok(self.next_id)
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all customers of a tenant, in id order.
    pub async fn customers(&self, tenant: TenantId) -> Vec<Customer> {
        let state = self.state.read().await;
        state
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant)
            .cloned()
            .collect()
    }

    /// Snapshot of all products of a tenant, in id order.
    pub async fn products(&self, tenant: TenantId) -> Vec<Product> {
        let state = self.state.read().await;
        state
            .products
            .values()
            .filter(|p| p.tenant_id == tenant)
            .cloned()
            .collect()
    }

    /// Snapshot of all orders of a tenant, in id order.
    pub async fn orders(&self, tenant: TenantId) -> Vec<Order> {
        let state = self.state.read().await;
        state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn create_tenant(
        &self,
        owner: UserId,
        tenant: NewTenant,
    ) -> Result<Tenant, RepositoryError> {
        let mut state = self.state.write().await;
        let id = TenantId::new(state.allocate_id()?);
        let tenant = Tenant {
            id,
            user_id: owner,
            name: tenant.name,
            store_url: tenant.store_url,
            api_token: tenant.api_token,
            created_at: Utc::now(),
        };
        state.tenants.insert(id, tenant.clone());
        Ok(tenant)
    }

    async fn list_tenants(&self, owner: UserId) -> Result<Vec<Tenant>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .tenants
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect())
    }

    async fn find_tenant(
        &self,
        id: TenantId,
        owner: UserId,
    ) -> Result<Option<Tenant>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .tenants
            .get(&id)
            .filter(|t| t.user_id == owner)
            .cloned())
    }

    async fn upsert_customer(
        &self,
        tenant: TenantId,
        upsert: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        let mut state = self.state.write().await;

        if let Some(id) = state.customers_by_remote.get(&upsert.remote_id).copied() {
            let customer = state
                .customers
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling customer {id}")))?;
            if let Some(name) = &upsert.update.name {
                customer.name.clone_from(name);
            }
            if let Some(email) = &upsert.update.email {
                customer.email.clone_from(email);
            }
            return Ok(customer.clone());
        }

        let id = CustomerId::new(state.allocate_id()?);
        let customer = Customer {
            id,
            tenant_id: tenant,
            remote_id: upsert.remote_id.clone(),
            name: upsert.create.name.clone(),
            email: upsert.create.email.clone(),
        };
        state.customers_by_remote.insert(upsert.remote_id.clone(), id);
        state.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn find_customer_by_remote_id(
        &self,
        remote_id: &RemoteId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .customers_by_remote
            .get(remote_id)
            .and_then(|id| state.customers.get(id))
            .cloned())
    }

    async fn upsert_product(
        &self,
        tenant: TenantId,
        upsert: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;

        if let Some(id) = state.products_by_remote.get(&upsert.remote_id).copied() {
            let product = state
                .products
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling product {id}")))?;
            product.title.clone_from(&upsert.title);
            product.price = upsert.price;
            return Ok(product.clone());
        }

        let id = ProductId::new(state.allocate_id()?);
        let product = Product {
            id,
            tenant_id: tenant,
            remote_id: upsert.remote_id.clone(),
            title: upsert.title.clone(),
            price: upsert.price,
        };
        state.products_by_remote.insert(upsert.remote_id.clone(), id);
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn upsert_order(
        &self,
        tenant: TenantId,
        upsert: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.state.write().await;

        if let Some(id) = state.orders_by_remote.get(&upsert.remote_id).copied() {
            let order = state
                .orders
                .get_mut(&id)
                .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling order {id}")))?;
            order.total = upsert.total;
            order.created_at = upsert.created_at;
            order.customer_id = upsert.customer_id;
            return Ok(order.clone());
        }

        let id = OrderId::new(state.allocate_id()?);
        let order = Order {
            id,
            tenant_id: tenant,
            remote_id: upsert.remote_id.clone(),
            total: upsert.total,
            created_at: upsert.created_at,
            customer_id: upsert.customer_id,
        };
        state.orders_by_remote.insert(upsert.remote_id.clone(), id);
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn count_customers(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        let count = state
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant)
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn count_orders(&self, tenant: TenantId) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        let count = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant)
            .count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn total_revenue(&self, tenant: TenantId) -> Result<Decimal, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant)
            .map(|o| o.total)
            .sum())
    }

    async fn customer_spend(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<CustomerSpend>, RepositoryError> {
        let state = self.state.read().await;

        let mut spend_by_customer: HashMap<CustomerId, Decimal> = HashMap::new();
        for order in state.orders.values() {
            if let Some(customer_id) = order.customer_id {
                *spend_by_customer.entry(customer_id).or_default() += order.total;
            }
        }

        Ok(state
            .customers
            .values()
            .filter(|c| c.tenant_id == tenant)
            .map(|c| CustomerSpend {
                customer_id: c.id,
                name: c.name.clone(),
                spend: spend_by_customer.get(&c.id).copied().unwrap_or_default(),
            })
            .collect())
    }

    async fn orders_between(
        &self,
        tenant: TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant && o.created_at >= from && o.created_at <= to)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::models::CustomerChanges;

    fn new_tenant() -> NewTenant {
        NewTenant {
            name: "Demo".to_string(),
            store_url: "https://demo.myshopify.com".to_string(),
            api_token: SecretString::from("token"),
        }
    }

    #[tokio::test]
    async fn test_find_tenant_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let tenant = store.create_tenant(UserId::new(1), new_tenant()).await.unwrap();

        assert!(store.find_tenant(tenant.id, UserId::new(1)).await.unwrap().is_some());
        assert!(store.find_tenant(tenant.id, UserId::new(2)).await.unwrap().is_none());
        assert!(store.list_tenants(UserId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customer_upsert_keeps_identity_and_tenant() {
        let store = MemoryStore::new();
        let tenant = store.create_tenant(UserId::new(1), new_tenant()).await.unwrap();
        let other = store.create_tenant(UserId::new(1), new_tenant()).await.unwrap();

        let first = store
            .upsert_customer(
                tenant.id,
                &CustomerUpsert::from_remote(RemoteId::new("c1"), Some("Ada".into()), None),
            )
            .await
            .unwrap();
        let second = store
            .upsert_customer(
                other.id,
                &CustomerUpsert::from_remote(RemoteId::new("c1"), Some("Grace".into()), None),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.tenant_id, tenant.id);
        assert_eq!(second.name, "Grace");
        assert_eq!(second.email, first.email);
    }

    #[tokio::test]
    async fn test_customer_update_without_changes_keeps_values() {
        let store = MemoryStore::new();
        let tenant = store.create_tenant(UserId::new(1), new_tenant()).await.unwrap();
        let upsert = CustomerUpsert::guest_for_order(&RemoteId::new("o1"));

        store.upsert_customer(tenant.id, &upsert).await.unwrap();
        let again = store
            .upsert_customer(
                tenant.id,
                &CustomerUpsert {
                    update: CustomerChanges::default(),
                    ..upsert
                },
            )
            .await
            .unwrap();

        assert_eq!(again.name, "Guest");
        assert_eq!(store.count_customers(tenant.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_total_revenue_is_zero_without_orders() {
        let store = MemoryStore::new();
        let tenant = store.create_tenant(UserId::new(1), new_tenant()).await.unwrap();
        assert_eq!(store.total_revenue(tenant.id).await.unwrap(), Decimal::ZERO);
    }
}
