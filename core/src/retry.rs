//! Backoff schedule and retryable failure kinds.

use std::time::Duration;

/// Failure classes the retry loop may re-attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request exceeded the client timeout.
    Timeout,
    /// The server could not be reached.
    ConnectionFailed,
    /// A success response body was not valid JSON.
    Parsing,
    /// The server answered with a retryable error code or a 5xx status.
    RetryableProtocol,
}

impl FailureKind {
    pub const ALL: [FailureKind; 4] = [
        FailureKind::Timeout,
        FailureKind::ConnectionFailed,
        FailureKind::Parsing,
        FailureKind::RetryableProtocol,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of send attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub interval: Duration,
    /// Multiplier applied to `interval` for each further retry.
    pub backoff_factor: f64,
    /// Extra wait imposed after a rate-limit error, on top of the backoff.
    pub rate_limit_cooldown: Duration,
    pub retry_on: Vec<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            interval: Duration::from_millis(500),
            backoff_factor: 2.0,
            rate_limit_cooldown: Duration::from_secs(60),
            retry_on: FailureKind::ALL.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends every request exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    pub fn with_retry_on(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    pub fn retries(&self, kind: FailureKind) -> bool {
        self.retry_on.contains(&kind)
    }

    /// Wait before the `retry`-th re-attempt (0-based):
    /// `interval * backoff_factor ^ retry`, saturating at `Duration::MAX`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.interval.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.backoff_factor.powi(exponent).max(0.0);
        Duration::try_from_secs_f64(self.interval.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }
}
