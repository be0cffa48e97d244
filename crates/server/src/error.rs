//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//! Clients always receive a JSON body of the form `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::middleware::AuthError;
use crate::sync::{AggregationError, SyncError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bearer authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Sync could not run or did not complete.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Statistics could not be computed; `message` is shown to the client.
    #[error("{message}: {source}")]
    Stats {
        message: &'static str,
        #[source]
        source: AggregationError,
    },

    /// Resource not found.
    #[error("{0}")]
    NotFound(&'static str),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is the server's fault.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Stats { .. } | Self::Sync(SyncError::Failed { .. })
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Stats { .. } | Self::Sync(SyncError::Failed { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Sync(SyncError::TenantNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Sync(SyncError::TenantNotFound(_)) => "Tenant not found".to_string(),
            Self::Sync(SyncError::Failed { .. }) => "Sync failed".to_string(),
            Self::Stats { message, .. } | Self::NotFound(message) => (*message).to_string(),
            Self::BadRequest(message) => message.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Called after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use storesync_core::TenantId;

    use super::*;
    use crate::sync::SyncFailure;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_tenant_not_found() {
        let (status, body) = render(AppError::Sync(SyncError::TenantNotFound(TenantId::new(3)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Tenant not found"}));
    }

    #[tokio::test]
    async fn test_sync_failure_hides_cause() {
        let err = AppError::Sync(SyncError::Failed {
            tenant_id: TenantId::new(3),
            cause: SyncFailure::Lookup(RepositoryError::DataCorruption("secret detail".into())),
        });
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Sync failed"}));
    }

    #[tokio::test]
    async fn test_stats_error_uses_context_message() {
        let err = AppError::Stats {
            message: "Failed to fetch stats",
            source: AggregationError::Store(RepositoryError::NotFound),
        };
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch stats"}));
    }

    #[tokio::test]
    async fn test_client_errors() {
        let (status, body) = render(AppError::Auth(AuthError::MissingToken)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "No token provided"}));

        let (status, body) = render(AppError::BadRequest("bad date".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "bad date"}));
    }
}
