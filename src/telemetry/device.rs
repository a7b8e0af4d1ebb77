use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One device reading as returned by the telemetry endpoint.
///
/// The aggregator only counts and concatenates these, it never interprets
/// the fields. Missing fields, unexpected types and unknown keys are all
/// carried through to the report as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub sn: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub power: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub status: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub last_updated: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    pub fn new(
        sn: impl Into<String>,
        power: impl Into<Value>,
        status: impl Into<Value>,
        last_updated: impl Into<Value>,
    ) -> Self {
        Self {
            sn: sn.into(),
            power: power.into(),
            status: status.into(),
            last_updated: last_updated.into(),
            extra: Map::new(),
        }
    }
}

/// Request body accepted by the telemetry endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub sn_list: Vec<String>,
}

/// Success payload returned by the telemetry endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub data: Vec<DeviceRecord>,
}

/// Build the device population as a zero-padded index sequence,
/// e.g. `SN-000` .. `SN-499` for `("SN-", 3, 500)`.
pub fn generate_population(prefix: &str, width: usize, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}{:0width$}", prefix, i, width = width))
        .collect()
}
