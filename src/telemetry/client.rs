use crate::config::types::EndpointConfig;
use crate::telemetry::device::{DeviceRecord, QueryRequest, QueryResponse};
use crate::telemetry::signer::{SignError, Signer};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client setup failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("invalid signing parameters: {0}")]
    Sign(#[from] SignError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Classified result of a single request for one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Success(Vec<DeviceRecord>),
    RateLimited,
    NetworkError(String),
    OtherFailure { status: u16, message: String },
    ParseFailure(String),
}

impl BatchOutcome {
    /// Rate limiting and network failures may clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            BatchOutcome::RateLimited | BatchOutcome::NetworkError(_) => true,
            BatchOutcome::Success(_)
            | BatchOutcome::OtherFailure { .. }
            | BatchOutcome::ParseFailure(_) => false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success(_))
    }

    /// HTTP status associated with the outcome, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BatchOutcome::Success(_) | BatchOutcome::ParseFailure(_) => Some(200),
            BatchOutcome::RateLimited => Some(429),
            BatchOutcome::OtherFailure { status, .. } => Some(*status),
            BatchOutcome::NetworkError(_) => None,
        }
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Success(records) => write!(f, "fetched {} records", records.len()),
            BatchOutcome::RateLimited => write!(f, "rate limited by endpoint"),
            BatchOutcome::NetworkError(msg) => write!(f, "network error: {}", msg),
            BatchOutcome::OtherFailure { status, message } => {
                write!(f, "endpoint returned status {}: {}", status, message)
            }
            BatchOutcome::ParseFailure(msg) => write!(f, "unparseable response: {}", msg),
        }
    }
}

/// Sends one batch of device identifiers and classifies what came back.
///
/// Implementations perform exactly one request per call; repetition is the
/// caller's concern.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, batch: &[String]) -> BatchOutcome;
}

/// HTTP transport for the telemetry endpoint
#[derive(Debug)]
pub struct TelemetryClient {
    url: String,
    signer: Signer,
    client: reqwest::Client,
}

impl TelemetryClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let signer = Signer::new(config.path.clone(), config.secret.clone())?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            url: format!("http://{}:{}{}", config.host, config.port, config.path),
            signer,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for TelemetryClient {
    async fn send(&self, batch: &[String]) -> BatchOutcome {
        // Fresh timestamp and signature on every call, retries included.
        let timestamp = Utc::now().timestamp_millis();
        let signature = self.signer.sign(timestamp);
        let body = QueryRequest {
            sn_list: batch.to_vec(),
        };

        tracing::trace!(url = %self.url, devices = batch.len(), timestamp, "Sending batch");

        let response = match self
            .client
            .post(&self.url)
            .header("signature", signature)
            .header("timestamp", timestamp.to_string())
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return BatchOutcome::NetworkError(e.to_string()),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return BatchOutcome::RateLimited;
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return BatchOutcome::NetworkError(e.to_string()),
        };

        if status != StatusCode::OK {
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                text
            };
            return BatchOutcome::OtherFailure {
                status: status.as_u16(),
                message,
            };
        }

        match serde_json::from_str::<QueryResponse>(&text) {
            Ok(payload) => BatchOutcome::Success(payload.data),
            Err(e) => BatchOutcome::ParseFailure(e.to_string()),
        }
    }
}
