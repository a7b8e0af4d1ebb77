use crate::aggregator::report::{AggregationReport, BatchFailure, ReportBuilder};
use crate::config::types::{AggregationConfig, Config};
use crate::telemetry::batcher::{partition, BatchError};
use crate::telemetry::client::{BatchOutcome, ClientError, TelemetryClient, Transport};
use crate::telemetry::device::generate_population;
use crate::telemetry::retry::RetryPolicy;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid batching: {0}")]
    Batch(#[from] BatchError),

    #[error("device identifier at position {0} is empty")]
    EmptyDeviceId(usize),

    #[error("device identifier '{0}' appears more than once")]
    DuplicateDeviceId(String),

    #[error("telemetry client error: {0}")]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSettings {
    pub batch_size: usize,
    /// Pause between consecutive batches, whatever their outcome
    pub request_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            request_interval: Duration::from_millis(1000),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AggregationConfig> for AggregationSettings {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            request_interval: config.request_interval,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Drives a device population through the transport one batch at a time.
///
/// Batches are never dispatched concurrently: the endpoint enforces a global
/// request ceiling, and the fixed pause between batches is what keeps the run
/// under it. All run state lives inside `run`.
pub struct Aggregator<T> {
    transport: T,
    settings: AggregationSettings,
}

impl<T: Transport> Aggregator<T> {
    pub fn new(transport: T, settings: AggregationSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[tracing::instrument(
        name = "aggregation",
        skip_all,
        fields(run_id = %uuid::Uuid::new_v4(), devices = population.len())
    )]
    pub async fn run(&self, population: &[String]) -> Result<AggregationReport, AggregateError> {
        validate_population(population)?;

        let start = Instant::now();
        let batches = partition(population, self.settings.batch_size)?;
        let batch_count = batches.len();

        info!(
            batches = batch_count,
            batch_size = self.settings.batch_size,
            "Starting aggregation"
        );

        let mut report = ReportBuilder::new(population.len());

        for (position, batch) in batches.into_iter().enumerate() {
            let batch_index = position + 1;

            match self.settings.retry.attempt(&self.transport, &batch).await {
                BatchOutcome::Success(records) => {
                    debug!(batch_index, records = records.len(), "Batch fetched");
                    report.push_records(records);
                }
                outcome => {
                    warn!(
                        batch_index,
                        status = ?outcome.status_code(),
                        outcome = %outcome,
                        "Batch failed permanently"
                    );
                    report.push_failure(BatchFailure {
                        batch_index,
                        status_code: outcome.status_code(),
                        error: outcome.to_string(),
                        devices: batch,
                    });
                }
            }

            if batch_index < batch_count {
                tokio::time::sleep(self.settings.request_interval).await;
            }
        }

        let report = report.finish(start.elapsed());

        info!(
            fetched = report.fetched_devices,
            total = report.total_devices,
            failed_batches = report.failed_batches,
            seconds = report.execution_time_seconds,
            "Aggregation complete"
        );

        Ok(report)
    }
}

/// Run one aggregation against the endpoint and population described by `config`.
pub async fn aggregate(config: &Config) -> Result<AggregationReport, AggregateError> {
    let client = TelemetryClient::new(&config.endpoint)?;
    let population = generate_population(
        &config.population.prefix,
        config.population.width,
        config.population.count,
    );

    info!(url = %client.url(), "Aggregating telemetry");

    Aggregator::new(client, AggregationSettings::from(&config.aggregation))
        .run(&population)
        .await
}

fn validate_population(population: &[String]) -> Result<(), AggregateError> {
    let mut seen = HashSet::with_capacity(population.len());

    for (position, id) in population.iter().enumerate() {
        if id.trim().is_empty() {
            return Err(AggregateError::EmptyDeviceId(position));
        }
        if !seen.insert(id.as_str()) {
            return Err(AggregateError::DuplicateDeviceId(id.clone()));
        }
    }

    Ok(())
}
