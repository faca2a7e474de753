//! The shared outbound client: process-wide call spacing plus bounded retries.
//!
//! One instance is shared (via `Arc`) by every caller in a run, so the spacing
//! applies across forum and explorer traffic alike. Backoff sleeps block the
//! calling task; that suits a sequential batch audit, not a latency-sensitive
//! service.

use crate::error::ClientError;
use crate::retry::{Attempt, RetryPolicy, RetryState};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default minimum gap between two outbound calls.
pub const DEFAULT_SPACING: Duration = Duration::from_millis(500);

/// A completed call: either a successful response or an authoritative 404.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(HttpResponse),
    NotFound,
}

pub struct RateLimitedRetryingClient<T> {
    transport: T,
    spacing: Duration,
    policy: RetryPolicy,
    /// When the previous call was dispatched.
    last_call: Mutex<Option<Instant>>,
}

impl<T: HttpTransport> RateLimitedRetryingClient<T> {
    pub fn new(transport: T, spacing: Duration, policy: RetryPolicy) -> Self {
        Self {
            transport,
            spacing,
            policy,
            last_call: Mutex::new(None),
        }
    }

    /// Client with the default 500 ms spacing and 3 × 3 s retry policy.
    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, DEFAULT_SPACING, RetryPolicy::default())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Wait until at least `spacing` has passed since the previous call, then
    /// claim the slot. The lock is held while sleeping so callers queue in order.
    async fn pace(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.spacing;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }

    async fn attempt(&self, request: &HttpRequest) -> Attempt<FetchOutcome> {
        self.pace().await;
        match self.transport.send(request).await {
            Ok(response) if response.is_success() => Attempt::Success(FetchOutcome::Success(response)),
            Ok(response) if response.status == 404 => Attempt::Success(FetchOutcome::NotFound),
            Ok(response) if response.is_retryable() => {
                Attempt::Retryable(format!("HTTP status {}", response.status))
            }
            Ok(response) => Attempt::Fatal(ClientError::Rejected {
                status: response.status,
                url: request.url.clone(),
            }),
            Err(e) if e.is_retryable() => Attempt::Retryable(e.to_string()),
            Err(e) => Attempt::Fatal(ClientError::Transport(e)),
        }
    }

    /// Send `request`, retrying transient failures per the policy.
    ///
    /// A 404 is a successful [`FetchOutcome::NotFound`], never retried.
    pub async fn execute(&self, request: &HttpRequest) -> Result<FetchOutcome, ClientError> {
        let mut state = RetryState::Attempting(1);
        loop {
            state = match state {
                RetryState::Attempting(n) => {
                    if n > 1 {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                    debug!(url = %request.url, attempt = n, "sending request");
                    let result = self.attempt(request).await;
                    if let Attempt::Retryable(reason) = &result {
                        warn!(
                            url = %request.url,
                            attempt = n,
                            max_attempts = self.policy.max_attempts(),
                            %reason,
                            "transient failure"
                        );
                    }
                    self.policy.transition(n, result)
                }
                RetryState::Succeeded(outcome) => return Ok(outcome),
                RetryState::Failed(err) => return Err(err),
            };
        }
    }
}
