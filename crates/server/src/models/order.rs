//! Order model and upsert input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use storesync_core::{CustomerId, OrderId, RemoteId, TenantId};

/// A reconciled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub remote_id: RemoteId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// When the order was placed, as reported by the remote store.
    pub created_at: DateTime<Utc>,
    /// `None` when the referenced remote customer has not been synced.
    pub customer_id: Option<CustomerId>,
}

/// Create-or-update an order keyed by remote identity.
///
/// Total, timestamp and customer are overwritten on update; the tenant is
/// only set on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpsert {
    pub remote_id: RemoteId,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub customer_id: Option<CustomerId>,
}
