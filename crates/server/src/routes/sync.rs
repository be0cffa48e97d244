//! Sync route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use storesync_core::TenantId;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;
use crate::sync::SyncSummary;

/// Run a full sync of one of the caller's tenants.
#[instrument(skip_all, fields(tenant_id = %tenant_id, user_id = %user))]
pub async fn run(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<SyncSummary>> {
    let summary = state.orchestrator().sync_tenant(tenant_id, user).await?;
    Ok(Json(summary))
}
