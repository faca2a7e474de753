//! Bounded retry with fixed backoff, as an explicit state machine.

use crate::error::ClientError;
use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    /// Fixed pause before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// Transient failure; a later attempt may succeed.
    Retryable(String),
    /// Permanent failure; retrying cannot help.
    Fatal(ClientError),
}

/// Where a retried call stands.
#[derive(Debug)]
pub enum RetryState<T> {
    /// About to run attempt `n` (1-based).
    Attempting(u32),
    Succeeded(T),
    Failed(ClientError),
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Advance after attempt `attempt` produced `result`.
    pub fn transition<T>(&self, attempt: u32, result: Attempt<T>) -> RetryState<T> {
        match result {
            Attempt::Success(value) => RetryState::Succeeded(value),
            Attempt::Fatal(err) => RetryState::Failed(err),
            Attempt::Retryable(_) if attempt < self.max_attempts() => {
                RetryState::Attempting(attempt + 1)
            }
            Attempt::Retryable(last) => RetryState::Failed(ClientError::Exhausted {
                attempts: attempt,
                last,
            }),
        }
    }
}
