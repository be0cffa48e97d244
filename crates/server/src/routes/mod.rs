//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Liveness banner
//! GET  /health                        - Health check
//! GET  /health/ready                  - Store connectivity check
//!
//! # Tenants (requires auth)
//! POST /tenants                       - Register a remote store
//! GET  /tenants                       - List the caller's tenants
//! GET  /stores                        - Alias of GET /tenants
//!
//! # Sync (requires auth)
//! GET  /sync/{tenant_id}              - Run a full sync, returns the summary
//!
//! # Stats (requires auth)
//! GET  /stats/{tenant_id}             - Counts, revenue and top customers
//! GET  /stats/{tenant_id}/revenue     - Daily revenue (?startDate&endDate)
//! GET  /stats/{tenant_id}/orders      - Daily order count (?startDate&endDate)
//! ```

pub mod stats;
pub mod sync;
pub mod tenants;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Create the tenant routes router.
pub fn tenant_routes() -> Router<AppState> {
    Router::new().route("/", get(tenants::list).post(tenants::create))
}

/// Create the stats routes router.
pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/{tenant_id}", get(stats::summary))
        .route("/{tenant_id}/revenue", get(stats::revenue))
        .route("/{tenant_id}/orders", get(stats::orders))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/tenants", tenant_routes())
        .route("/stores", get(tenants::list))
        .route("/sync/{tenant_id}", get(sync::run))
        .nest("/stats", stats_routes())
}

async fn root() -> &'static str {
    "Server is running!"
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
