//! Merge remote records into the local store.
//!
//! Every record becomes one upsert keyed by its remote identity, so applying
//! the same batch twice leaves the store unchanged. Records of one resource
//! type are upserted concurrently, bounded by the configured worker count;
//! each `reconcile_*` call returns only after every record of the batch has
//! been written, which gives the orchestrator its barrier between phases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use storesync_core::{CustomerId, RawAmount, RemoteId, TenantId};
use tracing::instrument;

use super::ReconcileError;
use crate::db::SyncStore;
use crate::models::{CustomerUpsert, OrderUpsert, ProductUpsert};
use crate::remote::{RemoteCustomer, RemoteOrder, RemoteProduct};

/// Counts produced by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Customers upserted.
    pub customers: usize,
    /// Products upserted.
    pub products: usize,
    /// Orders upserted.
    pub orders: usize,
    /// Orders placed without a customer, attributed to a guest customer.
    pub guests_synthesized: usize,
    /// Orders whose referenced customer is not in the store.
    pub unresolved_customer_refs: usize,
}

/// How an order's customer association was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CustomerLink {
    Customer,
    Guest,
    Unresolved,
}

/// Upsert engine for one sync.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn SyncStore>,
    concurrency: usize,
}

impl Reconciler {
    /// Create a reconciler running at most `concurrency` upserts at a time.
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Upsert every remote customer.
    ///
    /// New customers get placeholder name and email when the remote omits
    /// them; existing customers only have the values the remote reports
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReconcileError::Store`] encountered.
    #[instrument(skip(self, customers), fields(tenant_id = %tenant, count = customers.len()))]
    pub async fn reconcile_customers(
        &self,
        tenant: TenantId,
        customers: Vec<RemoteCustomer>,
    ) -> Result<usize, ReconcileError> {
        let store = &self.store;
        stream::iter(customers)
            .map(|customer| async move {
                let upsert =
                    CustomerUpsert::from_remote(customer.id, customer.first_name, customer.email);
                store
                    .upsert_customer(tenant, &upsert)
                    .await
                    .map_err(|source| ReconcileError::Store {
                        entity: "customer",
                        remote_id: upsert.remote_id.clone(),
                        source,
                    })
            })
            .buffer_unordered(self.concurrency)
            .try_fold(0, |count, _| async move { Ok(count + 1) })
            .await
    }

    /// Upsert every remote product.
    ///
    /// The price is the first variant's; a product without variants, or with
    /// an unparseable price, is stored at zero.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReconcileError::Store`] encountered.
    #[instrument(skip(self, products), fields(tenant_id = %tenant, count = products.len()))]
    pub async fn reconcile_products(
        &self,
        tenant: TenantId,
        products: Vec<RemoteProduct>,
    ) -> Result<usize, ReconcileError> {
        let store = &self.store;
        stream::iter(products)
            .map(|product| async move {
                let price = product
                    .variants
                    .first()
                    .map_or(Decimal::ZERO, |variant| {
                        amount_or_zero("product", &product.id, "price", variant.price.as_ref())
                    });
                let upsert = ProductUpsert {
                    remote_id: product.id,
                    title: product.title.unwrap_or_default(),
                    price,
                };
                store
                    .upsert_product(tenant, &upsert)
                    .await
                    .map_err(|source| ReconcileError::Store {
                        entity: "product",
                        remote_id: upsert.remote_id.clone(),
                        source,
                    })
            })
            .buffer_unordered(self.concurrency)
            .try_fold(0, |count, _| async move { Ok(count + 1) })
            .await
    }

    /// Upsert every remote order, resolving its customer.
    ///
    /// Must run after [`reconcile_customers`](Self::reconcile_customers) for
    /// the same batch so that customer references resolve.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::InvalidRecord`] for an order without a valid
    /// `created_at`, or the first [`ReconcileError::Store`] encountered.
    #[instrument(skip(self, orders), fields(tenant_id = %tenant, count = orders.len()))]
    pub async fn reconcile_orders(
        &self,
        tenant: TenantId,
        orders: Vec<RemoteOrder>,
    ) -> Result<ReconcileReport, ReconcileError> {
        let store = &self.store;
        stream::iter(orders)
            .map(|order| async move { reconcile_order(store.as_ref(), tenant, order).await })
            .buffer_unordered(self.concurrency)
            .try_fold(ReconcileReport::default(), |mut report, link| async move {
                report.orders += 1;
                match link {
                    CustomerLink::Customer => {}
                    CustomerLink::Guest => report.guests_synthesized += 1,
                    CustomerLink::Unresolved => report.unresolved_customer_refs += 1,
                }
                Ok(report)
            })
            .await
    }
}

async fn reconcile_order(
    store: &dyn SyncStore,
    tenant: TenantId,
    order: RemoteOrder,
) -> Result<CustomerLink, ReconcileError> {
    // Validate before writing anything so a rejected order leaves no guest.
    let created_at = parse_created_at(&order)?;
    let total = amount_or_zero("order", &order.id, "total_price", order.total_price.as_ref());

    let (customer_id, link) = resolve_customer(store, tenant, &order).await?;

    let upsert = OrderUpsert {
        remote_id: order.id,
        total,
        created_at,
        customer_id,
    };
    store
        .upsert_order(tenant, &upsert)
        .await
        .map_err(|source| ReconcileError::Store {
            entity: "order",
            remote_id: upsert.remote_id.clone(),
            source,
        })?;

    Ok(link)
}

async fn resolve_customer(
    store: &dyn SyncStore,
    tenant: TenantId,
    order: &RemoteOrder,
) -> Result<(Option<CustomerId>, CustomerLink), ReconcileError> {
    if let Some(customer_ref) = order.customer_ref() {
        let customer = store
            .find_customer_by_remote_id(customer_ref)
            .await
            .map_err(|source| ReconcileError::Store {
                entity: "customer",
                remote_id: customer_ref.clone(),
                source,
            })?;

        return Ok(match customer {
            Some(customer) => (Some(customer.id), CustomerLink::Customer),
            None => {
                tracing::warn!(
                    order = %order.id,
                    customer = %customer_ref,
                    "Order references a customer that is not in the store"
                );
                (None, CustomerLink::Unresolved)
            }
        });
    }

    let guest = CustomerUpsert::guest_for_order(&order.id);
    let customer = store
        .upsert_customer(tenant, &guest)
        .await
        .map_err(|source| ReconcileError::Store {
            entity: "customer",
            remote_id: guest.remote_id.clone(),
            source,
        })?;

    Ok((Some(customer.id), CustomerLink::Guest))
}

fn parse_created_at(order: &RemoteOrder) -> Result<DateTime<Utc>, ReconcileError> {
    let invalid = |reason: String| ReconcileError::InvalidRecord {
        entity: "order",
        remote_id: order.id.clone(),
        reason,
    };

    let raw = order
        .created_at
        .as_deref()
        .ok_or_else(|| invalid("missing created_at".to_string()))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| invalid(format!("invalid created_at {raw:?}: {e}")))
}

/// Parse a remote amount, substituting zero for missing or malformed values.
fn amount_or_zero(
    entity: &'static str,
    remote_id: &RemoteId,
    field: &'static str,
    raw: Option<&RawAmount>,
) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };

    raw.to_decimal().unwrap_or_else(|e| {
        tracing::warn!(entity, remote_id = %remote_id, field, error = %e, "Malformed amount, using 0");
        Decimal::ZERO
    })
}
