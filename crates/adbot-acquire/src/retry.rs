//! Retry with exponential back-off and jitter for outbound requests.
//!
//! Only transient server-side statuses (500, 502, 503, 504) are retried.
//! Client errors, transport failures, and malformed bodies are returned
//! immediately.

use std::future::Future;
use std::time::Duration;

use reqwest::Method;

use crate::error::AcquireError;

/// Statuses that trigger a retry.
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Delay ceiling for a single back-off sleep.
const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Sleep before the n-th retry is `backoff_base_ms * 2^(n-1)` (±25 %).
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    /// Nominal (jitter-free) delay before retry number `retry` (1-based).
    #[must_use]
    pub fn nominal_delay_ms(&self, retry: u32) -> u64 {
        let exp = retry.saturating_sub(1).min(20);
        self.backoff_base_ms
            .saturating_mul(1u64 << exp)
            .min(MAX_DELAY_MS)
    }
}

/// Methods allowed to be replayed automatically.
#[must_use]
pub fn is_retriable_method(method: &Method) -> bool {
    [Method::HEAD, Method::GET, Method::OPTIONS, Method::POST].contains(method)
}

pub(crate) fn is_retriable(err: &AcquireError) -> bool {
    match err {
        AcquireError::HttpStatus { status, .. } => RETRY_STATUSES.contains(status),
        AcquireError::Transport(_)
        | AcquireError::Auth(_)
        | AcquireError::Malformed { .. }
        | AcquireError::Deserialize { .. }
        | AcquireError::InvalidRequest(_)
        | AcquireError::Cancelled => false,
    }
}

/// Runs `operation`, retrying up to `policy.max_retries` times on transient
/// errors.
///
/// | Retry | Sleep (`backoff_base_ms = 2_000`) |
/// |-------|-----------------------------------|
/// | 1     | 2 000 ms ± 25 %                   |
/// | 2     | 4 000 ms ± 25 %                   |
/// | 3     | 8 000 ms ± 25 %                   |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, AcquireError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AcquireError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let nominal = policy.nominal_delay_ms(attempt);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (nominal as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient server error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
