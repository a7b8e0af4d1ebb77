use crate::aggregator::{aggregate, AggregateError, AggregationReport};
use crate::config::{load_or_default, ConfigError};
use crate::mock::MockState;
use crate::telemetry::signer::SignError;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mock endpoint setup failed: {0}")]
    Mock(#[from] SignError),

    #[error("server error: {0}")]
    Server(String),
}

/// Run one aggregation and print the report as JSON on stdout.
pub async fn run(config_path: Option<&Path>) -> Result<AggregationReport, RunError> {
    let config = load_or_default(config_path)?;
    let report = aggregate(&config).await?;

    if report.failed_batches > 0 {
        warn!(
            failed_batches = report.failed_batches,
            missing_devices = report.missing_devices(),
            "Some batches could not be fetched"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}

/// Start the HTTP trigger service.
pub async fn serve(config_path: Option<&Path>) -> Result<(), RunError> {
    let config = load_or_default(config_path)?;
    crate::web::run_server(config)
        .await
        .map_err(|e| RunError::Server(e.to_string()))
}

/// Start the mock telemetry endpoint.
pub async fn mock(config_path: Option<&Path>) -> Result<(), RunError> {
    let config = load_or_default(config_path)?;
    let state = Arc::new(MockState::from_config(&config)?);

    info!("Mock endpoint running, press Ctrl+C to stop");

    tokio::select! {
        result = crate::mock::start_server(&config.mock.listen, &config.endpoint.path, state) => {
            result.map_err(|e| RunError::Server(e.to_string()))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
