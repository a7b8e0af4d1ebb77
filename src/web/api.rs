use crate::aggregator::{aggregate, AggregationReport};
use crate::config::types::Config;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Held for the duration of a run so overlapping triggers queue up
    /// instead of doubling the request rate against the endpoint.
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            run_lock: Mutex::new(()),
        }
    }
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/aggregate
///
/// Runs a full aggregation before responding, which takes roughly one second
/// per batch.
pub async fn trigger_aggregation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AggregationReport>, ApiError> {
    let _guard = state.run_lock.lock().await;

    let report = aggregate(&state.config).await.map_err(|e| {
        tracing::error!(error = %e, "Aggregation failed");
        ApiError::InternalError(e.to_string())
    })?;

    Ok(Json(report))
}

#[derive(Debug)]
pub enum ApiError {
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (
            status,
            Json(serde_json::json!({ "success": false, "error": message })),
        )
            .into_response()
    }
}
