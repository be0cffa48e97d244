//! Tenant-scoped statistics over the reconciled store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use storesync_core::{DateRange, TenantId};
use tracing::instrument;

use super::AggregationError;
use crate::db::SyncStore;
use crate::models::{CustomerSpend, Order};

/// Number of customers reported in [`Summary::top_customers`].
pub const TOP_CUSTOMER_LIMIT: usize = 5;

/// Headline statistics for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_customers: i64,
    pub total_orders: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub top_customers: Vec<TopCustomer>,
}

/// A customer ranked by lifetime spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCustomer {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub spend: Decimal,
}

/// What a daily series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMetric {
    /// Sum of order totals per day.
    Revenue,
    /// Number of orders per day.
    Count,
}

/// One value per calendar day, index-aligned with its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySeries {
    /// `YYYY-MM-DD`, ascending.
    pub labels: Vec<String>,
    #[serde(serialize_with = "serialize_points")]
    pub data: Vec<Decimal>,
}

impl DailySeries {
    /// A series with no days.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            labels: Vec::new(),
            data: Vec::new(),
        }
    }
}

/// Read-side statistics service.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn SyncStore>,
}

impl Aggregator {
    #[must_use]
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Customer and order counts, total revenue and the top spenders.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError`] if the store cannot be read.
    #[instrument(skip(self), fields(tenant_id = %tenant))]
    pub async fn compute_summary(&self, tenant: TenantId) -> Result<Summary, AggregationError> {
        let total_customers = self.store.count_customers(tenant).await?;
        let total_orders = self.store.count_orders(tenant).await?;
        let total_revenue = self.store.total_revenue(tenant).await?;
        let spend = self.store.customer_spend(tenant).await?;

        Ok(Summary {
            total_customers,
            total_orders,
            total_revenue,
            top_customers: rank_top_customers(spend, TOP_CUSTOMER_LIMIT),
        })
    }

    /// Per-day revenue or order count over an inclusive UTC date range.
    ///
    /// Days without orders are reported as zero. An inverted range yields an
    /// empty series.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError`] if the store cannot be read.
    #[instrument(skip(self), fields(tenant_id = %tenant))]
    pub async fn compute_daily_series(
        &self,
        tenant: TenantId,
        range: DateRange,
        metric: SeriesMetric,
    ) -> Result<DailySeries, AggregationError> {
        if range.is_empty() {
            return Ok(DailySeries::empty());
        }

        let orders = self
            .store
            .orders_between(tenant, range.lower_bound(), range.upper_bound())
            .await?;

        Ok(bucket_daily(&orders, range, metric))
    }
}

/// Rank customers by descending spend, keeping at most `limit`.
///
/// The sort is stable, so equal spends keep their input order; the store
/// returns customers in ascending id order.
#[must_use]
pub fn rank_top_customers(mut spend: Vec<CustomerSpend>, limit: usize) -> Vec<TopCustomer> {
    spend.sort_by(|a, b| b.spend.cmp(&a.spend));
    spend
        .into_iter()
        .take(limit)
        .map(|c| TopCustomer {
            name: c.name,
            spend: c.spend,
        })
        .collect()
}

/// Bucket orders by UTC calendar day over every day of `range`.
#[must_use]
pub fn bucket_daily(orders: &[Order], range: DateRange, metric: SeriesMetric) -> DailySeries {
    let mut buckets: BTreeMap<NaiveDate, Decimal> = range.days().map(|d| (d, Decimal::ZERO)).collect();

    for order in orders {
        if let Some(bucket) = buckets.get_mut(&order.created_at.date_naive()) {
            *bucket += match metric {
                SeriesMetric::Revenue => order.total,
                SeriesMetric::Count => Decimal::ONE,
            };
        }
    }

    let labels = range.labels().collect();
    let data = buckets.into_values().collect();
    DailySeries { labels, data }
}

/// Whole values serialize as JSON integers, everything else as floats.
fn serialize_points<S: Serializer>(data: &[Decimal], serializer: S) -> Result<S::Ok, S::Error> {
    use rust_decimal::prelude::ToPrimitive;
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(data.len()))?;
    for value in data {
        if value.fract().is_zero()
            && let Some(whole) = value.to_i64()
        {
            seq.serialize_element(&whole)?;
        } else {
            seq.serialize_element(&value.to_f64().unwrap_or_default())?;
        }
    }
    seq.end()
}
