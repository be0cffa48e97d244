//! Synchronization engine.
//!
//! A sync pulls a tenant's remote collections, reconciles them into the local
//! store and reports the resulting aggregates:
//!
//! ```text
//! RemoteStore ──fetch──▶ Reconciler ──upsert──▶ SyncStore ──read──▶ Aggregator
//!        customers, products, orders      (phase barrier)        Summary
//! ```
//!
//! [`SyncOrchestrator`] sequences the three stages for one tenant. Upserts
//! within a phase run concurrently; a phase completes before the next starts.
//! There is no sync-wide transaction: a failed sync leaves the upserts it
//! already applied in place, and re-running it converges.

pub mod aggregate;
pub mod orchestrator;
pub mod reconcile;

use std::time::Duration;

use storesync_core::{RemoteId, TenantId};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::remote::RemoteError;

pub use aggregate::{Aggregator, DailySeries, SeriesMetric, Summary, TOP_CUSTOMER_LIMIT, TopCustomer};
pub use orchestrator::{SyncOptions, SyncOrchestrator, SyncSummary};
pub use reconcile::{ReconcileReport, Reconciler};

/// Errors raised while merging remote records into the store.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The store rejected an upsert or lookup.
    #[error("failed to store {entity} {remote_id}: {source}")]
    Store {
        entity: &'static str,
        remote_id: RemoteId,
        #[source]
        source: RepositoryError,
    },

    /// A remote record is missing a value it cannot be stored without.
    #[error("invalid {entity} {remote_id}: {reason}")]
    InvalidRecord {
        entity: &'static str,
        remote_id: RemoteId,
        reason: String,
    },
}

/// Errors raised while reading aggregates.
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("failed to read aggregates: {0}")]
    Store(#[from] RepositoryError),
}

/// Why a sync did not complete.
#[derive(Debug, Error)]
pub enum SyncFailure {
    #[error("tenant lookup failed: {0}")]
    Lookup(#[source] RepositoryError),

    #[error("failed to fetch {resource}: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Aggregate(#[from] AggregationError),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Errors returned by [`SyncOrchestrator::sync_tenant`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The tenant does not exist or is not owned by the requesting user.
    #[error("tenant {0} not found")]
    TenantNotFound(TenantId),

    /// The sync started but did not complete.
    #[error("sync of tenant {tenant_id} failed: {cause}")]
    Failed {
        tenant_id: TenantId,
        #[source]
        cause: SyncFailure,
    },
}

impl SyncError {
    pub(crate) const fn failed(tenant_id: TenantId, cause: SyncFailure) -> Self {
        Self::Failed { tenant_id, cause }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display_includes_cause() {
        let err = SyncError::failed(
            TenantId::new(4),
            SyncFailure::Fetch {
                resource: "orders",
                source: RemoteError::Auth(401),
            },
        );
        assert_eq!(
            err.to_string(),
            "sync of tenant 4 failed: failed to fetch orders: remote store rejected credentials (HTTP 401)"
        );
    }

    #[test]
    fn test_timed_out_display() {
        let failure = SyncFailure::TimedOut(Duration::from_secs(120));
        assert_eq!(failure.to_string(), "timed out after 120s");
    }

    #[test]
    fn test_invalid_record_display() {
        let err = ReconcileError::InvalidRecord {
            entity: "order",
            remote_id: RemoteId::new("9"),
            reason: "missing created_at".to_string(),
        };
        assert_eq!(err.to_string(), "invalid order 9: missing created_at");
    }
}
