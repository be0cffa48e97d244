//! storesync server - Multi-tenant remote store sync and analytics.
//!
//! Each tenant is a remote Shopify store owned by a user. A sync pulls the
//! store's customers, products and orders, reconciles them into the local
//! store keyed by remote identity, and returns headline statistics.
//!
//! # Architecture
//!
//! - [`remote`] - Read-only client for the remote store REST API
//! - [`sync`] - Reconciler, aggregator and the per-tenant sync orchestrator
//! - [`db`] - Repository trait with `PostgreSQL` and in-memory backends
//! - [`routes`] - Axum handlers for tenants, sync and stats
//!
//! The binary in `main.rs` wires these together; [`app`] is shared with the
//! integration tests so they exercise the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod remote;
pub mod routes;
pub mod state;
pub mod sync;

use std::time::Duration;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the application router with request tracing.
///
/// CORS and Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
