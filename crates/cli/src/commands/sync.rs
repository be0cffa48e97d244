//! One-off tenant sync.
//!
//! Runs the same sync as `GET /sync/{tenant_id}` without going through HTTP,
//! then prints the summary as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! storesync sync --tenant 1 --user 42
//! ```

use std::sync::Arc;

use storesync_core::{TenantId, UserId};
use storesync_server::config::{ConfigError, ServerConfig};
use storesync_server::db;
use storesync_server::remote::{RemoteError, ShopifyRestClient};
use storesync_server::sync::{SyncError, SyncOrchestrator};
use thiserror::Error;

/// Errors that can occur during a one-off sync.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Remote client error: {0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("Failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sync one tenant owned by `user` and print its summary.
///
/// # Errors
///
/// Fails on invalid configuration, an unreachable store, an unknown tenant
/// or any sync failure.
pub async fn run(tenant: TenantId, user: UserId) -> Result<(), SyncCommandError> {
    let config = ServerConfig::from_env()?;

    let store = db::connect(&config.store).await?;
    let remote = Arc::new(ShopifyRestClient::new(&config.remote)?);
    let orchestrator = SyncOrchestrator::new(store, remote, config.sync);

    tracing::info!(tenant_id = %tenant, user_id = %user, "Starting sync");
    let summary = orchestrator.sync_tenant(tenant, user).await?;
    let json = serde_json::to_string_pretty(&summary)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    Ok(())
}
