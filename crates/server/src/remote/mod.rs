//! Remote store REST client.
//!
//! # Architecture
//!
//! - One authenticated `GET` per resource collection
//!   (`<store_url>/admin/api/<version>/<resource>.json`)
//! - The tenant's access token travels in the `X-Shopify-Access-Token` header
//! - Each collection is fetched as a single page; cursor pagination is not
//!   followed, so stores with more records than one page are truncated
//! - No retries here: the sync orchestrator owns retry policy
//!
//! The [`RemoteStore`] trait is the seam the orchestrator depends on, so tests
//! and alternative platforms can supply their own implementation.

pub mod client;
pub mod types;

pub use client::ShopifyRestClient;
pub use types::{RemoteCustomer, RemoteOrder, RemoteOrderCustomer, RemoteProduct, RemoteVariant};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Tenant;

/// Errors that can occur when fetching from a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network failure, timeout, throttling or a server-side error.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The remote store rejected the tenant's credentials.
    #[error("remote store rejected credentials (HTTP {0})")]
    Auth(u16),

    /// The response was not the expected shape.
    #[error("unexpected remote response: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Source of a tenant's remote records.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every customer of the tenant's remote store.
    async fn fetch_customers(&self, tenant: &Tenant) -> Result<Vec<RemoteCustomer>, RemoteError>;

    /// Fetch every product of the tenant's remote store.
    async fn fetch_products(&self, tenant: &Tenant) -> Result<Vec<RemoteProduct>, RemoteError>;

    /// Fetch every order (any status) of the tenant's remote store.
    async fn fetch_orders(&self, tenant: &Tenant) -> Result<Vec<RemoteOrder>, RemoteError>;
}
