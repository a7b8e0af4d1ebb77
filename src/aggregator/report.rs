use crate::telemetry::device::DeviceRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final summary of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub success: bool,
    pub total_devices: usize,
    pub fetched_devices: usize,
    pub failed_batches: usize,
    pub execution_time_seconds: f64,
    pub data: Vec<DeviceRecord>,
    pub errors: Vec<BatchFailure>,
}

impl AggregationReport {
    /// Devices with no record in the report. The endpoint may return more
    /// records than it was asked for, so this bottoms out at zero.
    pub fn missing_devices(&self) -> usize {
        self.total_devices.saturating_sub(self.fetched_devices)
    }
}

/// A batch that could not be fetched during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    /// 1-based position of the batch within the run
    pub batch_index: usize,
    pub devices: Vec<String>,
    pub error: String,
    pub status_code: Option<u16>,
}

/// Accumulates results batch by batch; only `finish` produces a report.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    total_devices: usize,
    data: Vec<DeviceRecord>,
    errors: Vec<BatchFailure>,
}

impl ReportBuilder {
    pub(crate) fn new(total_devices: usize) -> Self {
        Self {
            total_devices,
            data: Vec::with_capacity(total_devices),
            errors: Vec::new(),
        }
    }

    pub(crate) fn push_records(&mut self, records: Vec<DeviceRecord>) {
        self.data.extend(records);
    }

    pub(crate) fn push_failure(&mut self, failure: BatchFailure) {
        self.errors.push(failure);
    }

    pub(crate) fn finish(self, elapsed: Duration) -> AggregationReport {
        AggregationReport {
            success: true,
            total_devices: self.total_devices,
            fetched_devices: self.data.len(),
            failed_batches: self.errors.len(),
            execution_time_seconds: round_seconds(elapsed),
            data: self.data,
            errors: self.errors,
        }
    }
}

fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
