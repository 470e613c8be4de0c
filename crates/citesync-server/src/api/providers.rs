//! `GET /api/v1/providers` — catalog plus adapter configuration status.

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::{ApiFailure, ApiResponse, AppState};

#[derive(Debug, Serialize)]
struct ProviderEntry {
    slug: String,
    display_name: String,
    tier: i16,
    auth_method: String,
    rate_per_minute: Option<i32>,
    rate_per_day: Option<i32>,
    enabled: bool,
    has_adapter: bool,
    configured: bool,
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiFailure> {
    let rows = citesync_db::list_providers(&state.pool).await?;
    let report = state.registry.status_report();

    let entries: Vec<ProviderEntry> = rows
        .into_iter()
        .map(|row| {
            let status = report.iter().find(|s| s.slug == row.slug);
            ProviderEntry {
                slug: row.slug,
                display_name: row.display_name,
                tier: row.tier,
                auth_method: row.auth_method,
                rate_per_minute: row.rate_per_minute,
                rate_per_day: row.rate_per_day,
                enabled: row.enabled,
                has_adapter: status.is_some_and(|s| s.has_adapter),
                configured: status.is_some_and(|s| s.configured),
            }
        })
        .collect();

    Ok(Json(ApiResponse::new(entries)))
}
