use crate::config::types::{Config, MockConfig};
use crate::telemetry::device::{DeviceRecord, QueryRequest, QueryResponse};
use crate::telemetry::signer::{SignError, Signer};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Admits at most one request per `tolerance` window.
///
/// Only accepted requests move the window, so a burst of rejected requests
/// cannot starve a well-behaved client.
#[derive(Debug)]
pub struct RateLimiter {
    tolerance: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(tolerance: Duration) -> Self {
        Self {
            tolerance,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    pub async fn try_acquire(&self) -> bool {
        let mut last = self.last_accepted.lock().await;
        let now = Instant::now();

        match *last {
            Some(previous) if now.duration_since(previous) < self.tolerance => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// State shared by the mock endpoint handlers
#[derive(Debug)]
pub struct MockState {
    pub signer: Signer,
    pub max_batch_size: usize,
    pub limiter: RateLimiter,
}

impl MockState {
    pub fn new(path: &str, secret: &str, mock: &MockConfig) -> Result<Self, SignError> {
        Ok(Self {
            signer: Signer::new(path, secret)?,
            max_batch_size: mock.max_batch_size,
            limiter: RateLimiter::new(mock.rate_limit_tolerance),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SignError> {
        Self::new(&config.endpoint.path, &config.endpoint.secret, &config.mock)
    }
}

/// POST {endpoint.path}
pub async fn query_devices(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let signature = header_str(&headers, "signature")?;
    let timestamp = header_str(&headers, "timestamp")?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| ApiError::Unauthorized(format!("invalid timestamp '{}'", timestamp)))?;

    if !state.signer.verify(timestamp, signature) {
        tracing::debug!(timestamp, "Rejected request with bad signature");
        return Err(ApiError::Unauthorized("invalid signature".to_string()));
    }

    let request: QueryRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?;

    if request.sn_list.is_empty() {
        return Err(ApiError::BadRequest("sn_list cannot be empty".to_string()));
    }
    if request.sn_list.len() > state.max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "sn_list holds {} devices, maximum is {}",
            request.sn_list.len(),
            state.max_batch_size
        )));
    }

    if !state.limiter.try_acquire().await {
        tracing::debug!(devices = request.sn_list.len(), "Rate limited request");
        return Err(ApiError::TooManyRequests);
    }

    let data = request.sn_list.iter().map(|sn| simulate_reading(sn)).collect();
    Ok(Json(QueryResponse { data }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("missing '{}' header", name)))
}

/// Readings are derived from the serial so repeated runs agree on everything
/// except `last_updated`.
pub fn simulate_reading(sn: &str) -> DeviceRecord {
    let seed: u32 = sn.bytes().map(u32::from).sum();
    let status = if seed % 7 == 0 { "Offline" } else { "Online" };
    let power = if status == "Offline" {
        0.0
    } else {
        f64::from(seed % 50) / 10.0 + 0.5
    };

    DeviceRecord::new(
        sn,
        format!("{:.1} kW", power),
        status,
        Utc::now().to_rfc3339(),
    )
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    TooManyRequests,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests".to_string(),
            ),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
