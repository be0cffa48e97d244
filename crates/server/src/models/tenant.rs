//! Tenant (registered remote store) model.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use storesync_core::{TenantId, UserId};

/// A registered external store whose data is synchronized locally.
///
/// Implements `Debug` manually to redact the remote access token. The token is
/// never serialized into API responses.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    /// Local tenant ID.
    pub id: TenantId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Remote store base URL (e.g. `https://shop.myshopify.com`).
    pub store_url: String,
    /// Remote access token (HIGH PRIVILEGE - redacted in debug output).
    #[serde(skip)]
    pub api_token: SecretString,
    /// When the tenant was registered.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tenant")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field("api_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Parameters for registering a tenant.
#[derive(Clone)]
pub struct NewTenant {
    /// Display name.
    pub name: String,
    /// Remote store base URL.
    pub store_url: String,
    /// Remote access token.
    pub api_token: SecretString,
}

impl std::fmt::Debug for NewTenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTenant")
            .field("name", &self.name)
            .field("store_url", &self.store_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}
