//! Tenant registration and listing.

use axum::{Json, extract::State};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{NewTenant, Tenant};
use crate::state::AppState;

/// Body of `POST /tenants`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub name: String,
    pub store_url: String,
    pub api_token: String,
}

impl TryFrom<CreateTenantRequest> for NewTenant {
    type Error = AppError;

    fn try_from(body: CreateTenantRequest) -> Result<Self> {
        let name = body.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }

        let store_url = body.store_url.trim().trim_end_matches('/');
        match Url::parse(store_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => return Err(AppError::BadRequest("storeUrl must be an http(s) URL".to_string())),
        }

        if body.api_token.trim().is_empty() {
            return Err(AppError::BadRequest("apiToken is required".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            store_url: store_url.to_string(),
            api_token: SecretString::from(body.api_token.trim().to_string()),
        })
    }
}

/// Register a tenant owned by the caller.
#[instrument(skip_all, fields(user_id = %user))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateTenantRequest>,
) -> Result<Json<Tenant>> {
    let tenant = state.store().create_tenant(user, body.try_into()?).await?;
    tracing::info!(tenant_id = %tenant.id, "Tenant registered");
    Ok(Json(tenant))
}

/// List the caller's tenants.
#[instrument(skip_all, fields(user_id = %user))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Tenant>>> {
    Ok(Json(state.store().list_tenants(user).await?))
}
