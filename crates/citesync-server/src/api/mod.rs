//! Read-only JSON API: health, provider status, coverage, batches.

mod batches;
mod coverage;
mod providers;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use citesync_providers::ProviderRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<ProviderRegistry>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta {
                request_id: Uuid::new_v4(),
                timestamp: Utc::now(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// API-level failure with a status code; engine/store errors map onto it.
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiFailure {
    pub fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                code: "not_found",
                message,
            },
        }
    }

    pub fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                code: "internal",
                message,
            },
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::new(self.body))).into_response()
    }
}

impl From<citesync_engine::EngineError> for ApiFailure {
    fn from(err: citesync_engine::EngineError) -> Self {
        use citesync_engine::EngineError;
        match &err {
            EngineError::DomainNotFound { .. }
            | EngineError::ProfileNotFound { .. }
            | EngineError::SubmissionNotFound { .. }
            | EngineError::UnknownProvider { .. } => Self::not_found(err.to_string()),
            EngineError::Db(citesync_db::DbError::NotFound) => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<citesync_db::DbError> for ApiFailure {
    fn from(err: citesync_db::DbError) -> Self {
        match err {
            citesync_db::DbError::NotFound => Self::not_found("record not found".to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match citesync_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(HealthData {
                status: "ok",
                database: "up",
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(HealthData {
                    status: "degraded",
                    database: "down",
                })),
            )
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(tower_http::cors::Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/providers", get(providers::list))
        .route("/api/v1/domains/{host}/coverage", get(coverage::show))
        .route("/api/v1/batches", get(batches::list))
        .route("/api/v1/batches/{public_id}", get(batches::show))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
