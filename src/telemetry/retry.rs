use crate::config::types::RetryConfig;
use crate::telemetry::client::{BatchOutcome, Transport};
use std::time::Duration;

/// Bounded fixed-delay retry around a single transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first one
    pub max_retries: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(2000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.delay,
        }
    }
}

impl RetryPolicy {
    /// Send `batch` until it succeeds, fails permanently, or the retry budget
    /// runs out. In the last case the final transient outcome is returned.
    pub async fn attempt<T>(&self, transport: &T, batch: &[String]) -> BatchOutcome
    where
        T: Transport + ?Sized,
    {
        let mut attempt = 0u32;

        loop {
            let outcome = transport.send(batch).await;

            if !outcome.is_transient() {
                return outcome;
            }

            if attempt >= self.max_retries {
                tracing::warn!(
                    attempts = attempt + 1,
                    outcome = %outcome,
                    "Retries exhausted"
                );
                return outcome;
            }

            attempt += 1;
            tracing::debug!(
                retry = attempt,
                max_retries = self.max_retries,
                delay_ms = self.delay.as_millis() as u64,
                outcome = %outcome,
                "Transient failure, backing off"
            );
            tokio::time::sleep(self.delay).await;
        }
    }
}
