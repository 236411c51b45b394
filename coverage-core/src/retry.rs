//! Bounded exponential-backoff retry around a single completion call.

use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{CompletionBackend, CompletionRequest, CompletionResult};
use crate::error::ReportError;

/// Retry configuration for one logical completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of backend calls, including the first (default: 4).
    pub max_attempts: usize,
    /// Delay before the second attempt; doubled after every retry (default: 2s).
    pub initial_delay: Duration,
    /// Optional ceiling for the doubled delay.
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(2),
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a validated policy.
    pub fn new(max_attempts: usize, initial_delay: Duration) -> Result<Self, ReportError> {
        let policy = Self {
            max_attempts,
            initial_delay,
            max_delay: None,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the initial backoff delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Cap the backoff delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Checks the preconditions `max_attempts >= 1` and `initial_delay > 0`.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.max_attempts == 0 {
            return Err(ReportError::config("max_attempts must be at least 1"));
        }
        if self.initial_delay.is_zero() {
            return Err(ReportError::config("initial_delay must be greater than zero"));
        }
        Ok(())
    }
}

/// Attempt counter and current delay, local to one [`invoke`] call.
#[derive(Debug)]
struct RetryState {
    attempt: usize,
    delay: Duration,
}

impl RetryState {
    const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            delay: policy.initial_delay,
        }
    }

    /// Returns the delay to sleep now and doubles the stored one.
    fn next_delay(&mut self, policy: &RetryPolicy) -> Duration {
        let current = self.delay;
        let doubled = self.delay.saturating_mul(2);
        self.delay = policy.max_delay.map_or(doubled, |cap| doubled.min(cap));
        policy.max_delay.map_or(current, |cap| current.min(cap))
    }
}

/// Calls the backend, retrying transient failures with exponential backoff.
///
/// Rate-limit and connectivity failures sleep for the current delay, double it and
/// try again until `policy.max_attempts` calls have been made; the last error is then
/// returned unchanged. Any other failure kind is returned immediately.
pub async fn invoke<B>(
    backend: &B,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> Result<CompletionResult, ReportError>
where
    B: CompletionBackend + ?Sized,
{
    policy.validate()?;
    let mut state = RetryState::new(policy);

    loop {
        state.attempt += 1;

        match backend.create_completion(request).await {
            Ok(result) => {
                debug!(attempt = state.attempt, model = %request.settings.model, "completion succeeded");
                return Ok(result);
            }
            Err(err) if err.is_retryable() && state.attempt < policy.max_attempts => {
                let delay = state.next_delay(policy);
                warn!(
                    attempt = state.attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient backend failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                debug!(attempt = state.attempt, error = %err, "giving up on backend call");
                return Err(err.into());
            }
        }
    }
}
