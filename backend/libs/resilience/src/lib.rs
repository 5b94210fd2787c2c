/// Resilience patterns for Kafka consumers
///
/// This library provides the retry pacing used when a consumer lane keeps
/// failing against its broker:
/// - **BackoffPolicy**: injectable strategy mapping consecutive failures to a delay
/// - **ExponentialBackoff**: exponential growth with a cap and optional jitter
/// - **NoBackoff**: retry immediately
///
/// # Example
///
/// ```rust
/// use resilience::{BackoffConfig, BackoffPolicy, ExponentialBackoff};
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::new(BackoffConfig {
///     jitter: false,
///     ..Default::default()
/// });
///
/// assert_eq!(policy.delay(1), Duration::from_millis(100));
/// assert_eq!(policy.delay(2), Duration::from_millis(200));
/// ```

pub mod backoff;

pub use backoff::{BackoffConfig, BackoffPolicy, ExponentialBackoff, NoBackoff};
