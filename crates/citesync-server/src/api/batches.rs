//! `GET /api/v1/batches` and `GET /api/v1/batches/{public_id}`.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiFailure, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    public_id: Uuid,
    name: String,
    status: String,
    total_count: i32,
    completed_count: i32,
    failed_count: i32,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<citesync_db::BatchRow> for BatchEntry {
    fn from(row: citesync_db::BatchRow) -> Self {
        Self {
            public_id: row.public_id,
            name: row.name,
            status: row.status,
            total_count: row.total_count,
            completed_count: row.completed_count,
            failed_count: row.failed_count,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiFailure> {
    let limit = params.limit.unwrap_or(20).clamp(1, 200);
    let rows = citesync_db::list_batches(&state.pool, params.status.as_deref(), limit).await?;
    let entries: Vec<BatchEntry> = rows.into_iter().map(BatchEntry::from).collect();
    Ok(Json(ApiResponse::new(entries)))
}

pub async fn show(
    State(state): State<AppState>,
    Path(public_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let row = citesync_db::get_batch_by_public_id(&state.pool, public_id).await?;
    Ok(Json(ApiResponse::new(BatchEntry::from(row))))
}
