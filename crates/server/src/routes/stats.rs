//! Statistics route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use storesync_core::{DateRange, TenantId, UserId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;
use crate::sync::{DailySeries, SeriesMetric, Summary};

/// Date range query parameters (`YYYY-MM-DD`, inclusive).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeQuery {
    fn to_range(&self) -> Result<DateRange> {
        let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
            return Err(AppError::BadRequest(
                "startDate and endDate are required".to_string(),
            ));
        };
        DateRange::parse(start, end).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

/// Headline statistics for one of the caller's tenants.
#[instrument(skip_all, fields(tenant_id = %tenant_id, user_id = %user))]
pub async fn summary(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<Summary>> {
    ensure_owned(&state, tenant_id, user).await?;

    let summary = state
        .aggregator()
        .compute_summary(tenant_id)
        .await
        .map_err(|source| AppError::Stats {
            message: "Failed to fetch stats",
            source,
        })?;

    Ok(Json(summary))
}

/// Daily revenue over a date range.
#[instrument(skip_all, fields(tenant_id = %tenant_id, user_id = %user))]
pub async fn revenue(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DailySeries>> {
    daily_series(
        &state,
        user,
        tenant_id,
        &query,
        SeriesMetric::Revenue,
        "Failed to fetch revenue data",
    )
    .await
}

/// Daily order count over a date range.
#[instrument(skip_all, fields(tenant_id = %tenant_id, user_id = %user))]
pub async fn orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(tenant_id): Path<TenantId>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DailySeries>> {
    daily_series(
        &state,
        user,
        tenant_id,
        &query,
        SeriesMetric::Count,
        "Failed to fetch orders data",
    )
    .await
}

async fn daily_series(
    state: &AppState,
    user: UserId,
    tenant_id: TenantId,
    query: &RangeQuery,
    metric: SeriesMetric,
    failure_message: &'static str,
) -> Result<Json<DailySeries>> {
    let range = query.to_range()?;
    ensure_owned(state, tenant_id, user).await?;

    let series = state
        .aggregator()
        .compute_daily_series(tenant_id, range, metric)
        .await
        .map_err(|source| AppError::Stats {
            message: failure_message,
            source,
        })?;

    Ok(Json(series))
}

/// 404 unless `tenant_id` exists and belongs to `user`.
async fn ensure_owned(state: &AppState, tenant_id: TenantId, user: UserId) -> Result<()> {
    state
        .store()
        .find_tenant(tenant_id, user)
        .await?
        .map(|_| ())
        .ok_or(AppError::NotFound("Tenant not found"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> RangeQuery {
        RangeQuery {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_range_requires_both_dates() {
        assert!(query(Some("2024-01-01"), None).to_range().is_err());
        assert!(query(None, None).to_range().is_err());
    }

    #[test]
    fn test_range_rejects_bad_date() {
        let err = query(Some("2024-13-01"), Some("2024-01-02")).to_range().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_inverted_range_is_accepted() {
        assert!(query(Some("2024-02-01"), Some("2024-01-01")).to_range().is_ok());
    }
}
