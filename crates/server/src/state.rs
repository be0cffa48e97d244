//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::db::SyncStore;
use crate::middleware::JwtVerifier;
use crate::remote::RemoteStore;
use crate::sync::{Aggregator, SyncOptions, SyncOrchestrator};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store, the sync engine and token verification.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn SyncStore>,
    orchestrator: SyncOrchestrator,
    aggregator: Aggregator,
    jwt: JwtVerifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Repository for tenants and reconciled entities
    /// * `remote` - Client for tenants' remote stores
    /// * `sync` - Sync tuning
    /// * `jwt_secret` - Key used to verify bearer tokens
    #[must_use]
    pub fn new(
        store: Arc<dyn SyncStore>,
        remote: Arc<dyn RemoteStore>,
        sync: SyncOptions,
        jwt_secret: &SecretString,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orchestrator: SyncOrchestrator::new(store.clone(), remote, sync),
                aggregator: Aggregator::new(store.clone()),
                jwt: JwtVerifier::new(jwt_secret),
                store,
            }),
        }
    }

    /// Get the store repository.
    #[must_use]
    pub fn store(&self) -> &dyn SyncStore {
        self.inner.store.as_ref()
    }

    /// Get the sync orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.inner.orchestrator
    }

    /// Get the statistics service.
    #[must_use]
    pub fn aggregator(&self) -> &Aggregator {
        &self.inner.aggregator
    }

    /// Get the bearer token verifier.
    #[must_use]
    pub fn jwt(&self) -> &JwtVerifier {
        &self.inner.jwt
    }
}
