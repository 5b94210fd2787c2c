/// Backoff policies with exponential growth and jitter
use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;

/// Decides how long to wait before retrying after consecutive failures.
///
/// Implementations are stateless; the caller tracks the failure count, so one
/// policy can be shared across independent lanes.
pub trait BackoffPolicy: Debug + Send + Sync {
    /// Delay after `failures` consecutive failures. Zero failures means no wait.
    fn delay(&self, failures: u32) -> Duration;
}

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first failure
    pub initial_backoff: Duration,
    /// Upper bound for any delay, jitter included
    pub max_backoff: Duration,
    /// Growth factor per consecutive failure
    pub backoff_multiplier: f64,
    /// Add random jitter to each delay (±20%)
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Retry immediately, no matter how many failures occurred
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl BackoffPolicy for NoBackoff {
    fn delay(&self, _failures: u32) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let max_ms = self.config.max_backoff.as_millis() as f64;
        let exponent = (failures - 1).min(63) as i32;
        let base_ms = (self.config.initial_backoff.as_millis() as f64
            * self.config.backoff_multiplier.powi(exponent))
        .min(max_ms);

        let delay_ms = if self.config.jitter {
            let jitter_factor = 1.0 + rand::thread_rng().gen_range(-0.2..0.2);
            (base_ms * jitter_factor).min(max_ms)
        } else {
            base_ms
        };

        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}
