//! `GET /api/v1/domains/{host}/coverage` — read-only coverage projection.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use super::{ApiFailure, ApiResponse, AppState};

pub async fn show(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let summary = citesync_engine::coverage_summary(&state.pool, &host).await?;
    Ok(Json(ApiResponse::new(summary)))
}
