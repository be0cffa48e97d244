//! Product model and upsert input.

use rust_decimal::Decimal;
use serde::Serialize;
use storesync_core::{ProductId, RemoteId, TenantId};

/// A reconciled product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub remote_id: RemoteId,
    pub title: String,
    /// Price of the first variant.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Create-or-update a product keyed by remote identity.
///
/// Title and price are written on both paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpsert {
    pub remote_id: RemoteId,
    pub title: String,
    pub price: Decimal,
}
