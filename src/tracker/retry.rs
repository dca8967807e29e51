//! Bounded exponential backoff for transient tracker failures, grounded on
//! the teacher's rate-limiter backoff shape.

use std::time::Duration;

use tracing::warn;

use super::TrackerError;

#[derive(Debug, Clone)]
pub struct TrackerRetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for TrackerRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl TrackerRetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(scaled as u64).min(self.max_delay)
    }

    /// Run `op` until it succeeds, returns a fatal error, or retry attempts
    /// are exhausted on repeated transient errors.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, TrackerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, TrackerError>>,
    {
        let mut last_error = None;
        for attempt in 0..self.max_attempts.max(1) {
            match op().await {
                Ok(value) => return Ok(value),
                Err(TrackerError::Transient(message)) => {
                    warn!(attempt, %message, "tracker request failed transiently, retrying");
                    last_error = Some(message);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(TrackerError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error: last_error.unwrap_or_default(),
        })
    }
}
