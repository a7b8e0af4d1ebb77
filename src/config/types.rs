use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub population: PopulationConfig,
    pub aggregation: AggregationConfig,
    pub server: ServerConfig,
    pub mock: MockConfig,
}

/// Where the telemetry endpoint lives and how requests to it are signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub secret: String,
    /// Per-request network timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            path: "/device/real/query".to_string(),
            secret: "interview_token_123".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub count: usize,
    pub prefix: String,
    /// Zero-padding width of the numeric part
    pub width: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            count: 500,
            prefix: "SN-".to_string(),
            width: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub batch_size: usize,
    #[serde(with = "humantime_serde")]
    pub request_interval: Duration,
    pub retry: RetryConfig,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            request_interval: Duration::from_millis(1000),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

/// Trigger service exposing the aggregation over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Local stand-in for the telemetry endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub listen: String,
    /// Minimum gap between accepted requests. Deliberately a little under the
    /// client's request interval to absorb scheduling jitter.
    #[serde(with = "humantime_serde")]
    pub rate_limit_tolerance: Duration,
    pub max_batch_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            rate_limit_tolerance: Duration::from_millis(950),
            max_batch_size: 10,
        }
    }
}
