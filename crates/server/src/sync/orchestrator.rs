//! Per-tenant sync sequencing: fetch, reconcile, aggregate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use storesync_core::{TenantId, UserId};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{
    Aggregator, ReconcileReport, Reconciler, Summary, SyncError, SyncFailure,
};
use crate::db::SyncStore;
use crate::models::Tenant;
use crate::remote::{RemoteError, RemoteStore};

/// Message returned with every successful sync.
pub const SYNC_SUCCESS_MESSAGE: &str = "Data synced successfully!";

/// Tuning knobs for a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum concurrent upserts within one phase.
    pub concurrency: usize,
    /// Total attempts per remote fetch; only transient failures are retried.
    pub fetch_attempts: u32,
    /// Delay before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Deadline for one whole sync, excluding time spent waiting for the
    /// tenant lock.
    pub timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_attempts: 2,
            retry_backoff: Duration::from_millis(250),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub message: String,
    #[serde(flatten)]
    pub summary: Summary,
    pub report: ReconcileReport,
}

/// Runs syncs, one at a time per tenant.
pub struct SyncOrchestrator {
    store: Arc<dyn SyncStore>,
    remote: Arc<dyn RemoteStore>,
    reconciler: Reconciler,
    aggregator: Aggregator,
    options: SyncOptions,
    tenant_locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn SyncStore>,
        remote: Arc<dyn RemoteStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(store.clone(), options.concurrency),
            aggregator: Aggregator::new(store.clone()),
            store,
            remote,
            options,
            tenant_locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Sync one tenant owned by `user` and return its refreshed summary.
    ///
    /// All three collections are fetched before anything is written. Then
    /// customers, products and orders are reconciled in that order, each
    /// phase finishing before the next begins. Concurrent calls for the same
    /// tenant run one after another.
    ///
    /// # Errors
    ///
    /// - [`SyncError::TenantNotFound`] if the tenant does not exist or is
    ///   owned by another user
    /// - [`SyncError::Failed`] for any fetch, store or timeout failure;
    ///   upserts applied before the failure are kept
    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user))]
    pub async fn sync_tenant(
        &self,
        tenant_id: TenantId,
        user: UserId,
    ) -> Result<SyncSummary, SyncError> {
        let tenant = self
            .store
            .find_tenant(tenant_id, user)
            .await
            .map_err(|e| SyncError::failed(tenant_id, SyncFailure::Lookup(e)))?
            .ok_or(SyncError::TenantNotFound(tenant_id))?;

        let lock = self.tenant_lock(tenant_id).await;
        let started = Instant::now();
        let result = {
            let _guard = lock.lock().await;
            tokio::time::timeout(self.options.timeout, self.run(&tenant))
                .await
                .unwrap_or(Err(SyncFailure::TimedOut(self.options.timeout)))
        };
        self.release_tenant_lock(tenant_id, &lock).await;

        match result {
            Ok(summary) => {
                tracing::info!(
                    customers = summary.report.customers,
                    products = summary.report.products,
                    orders = summary.report.orders,
                    guests = summary.report.guests_synthesized,
                    unresolved = summary.report.unresolved_customer_refs,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Sync completed"
                );
                Ok(summary)
            }
            Err(cause) => {
                tracing::error!(
                    error = %cause,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Sync failed"
                );
                Err(SyncError::failed(tenant_id, cause))
            }
        }
    }

    async fn tenant_lock(&self, tenant_id: TenantId) -> Arc<Mutex<()>> {
        let mut locks = self.tenant_locks.lock().await;
        locks.entry(tenant_id).or_default().clone()
    }

    /// Drop the tenant's lock entry once no other sync holds or awaits it.
    async fn release_tenant_lock(&self, tenant_id: TenantId, lock: &Arc<Mutex<()>>) {
        let mut locks = self.tenant_locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(lock) == 2 {
            locks.remove(&tenant_id);
        }
    }

    async fn run(&self, tenant: &Tenant) -> Result<SyncSummary, SyncFailure> {
        let remote = self.remote.as_ref();
        let customers = self
            .fetch("customers", || remote.fetch_customers(tenant))
            .await?;
        let products = self
            .fetch("products", || remote.fetch_products(tenant))
            .await?;
        let orders = self.fetch("orders", || remote.fetch_orders(tenant)).await?;

        let customers = self
            .reconciler
            .reconcile_customers(tenant.id, customers)
            .await?;
        let products = self
            .reconciler
            .reconcile_products(tenant.id, products)
            .await?;
        let report = ReconcileReport {
            customers,
            products,
            ..self.reconciler.reconcile_orders(tenant.id, orders).await?
        };

        let summary = self.aggregator.compute_summary(tenant.id).await?;

        Ok(SyncSummary {
            message: SYNC_SUCCESS_MESSAGE.to_string(),
            summary,
            report,
        })
    }

    /// Call `fetch`, retrying transient failures with linear backoff.
    async fn fetch<T, F, Fut>(
        &self,
        resource: &'static str,
        mut fetch: F,
    ) -> Result<Vec<T>, SyncFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, RemoteError>>,
    {
        let attempts = self.options.fetch_attempts.max(1);
        let mut attempt = 1;

        loop {
            match fetch().await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.options.retry_backoff * attempt;
                    tracing::warn!(
                        resource,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis(),
                        "Remote fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => return Err(SyncFailure::Fetch { resource, source }),
            }
        }
    }
}
