//! Retry policy and attempt classification for Vikunja API requests.

use log::{debug, warn};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

use crate::runtime::Runtime;

/// Maximum number of attempts for one logical request.
pub const MAX_ATTEMPTS: usize = 3;

/// Base delay before the first retry, in milliseconds. Doubles on each retry.
pub const BASE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry that follows attempt `attempt_index` (0-based).
    pub fn delay_for(&self, attempt_index: usize) -> Duration {
        let exponent = u32::try_from(attempt_index).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
    }
}

/// Failures surfaced by the request core. The client classifies, it does not
/// phrase messages for end users.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("rate limit still exceeded after {attempts} attempts")]
    RateLimitExhausted { attempts: usize, body: String },

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected {kind}: {detail}")]
    Unexpected { kind: String, detail: String },
}

impl ApiError {
    /// The HTTP status behind this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RateLimitExhausted { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of a failed request, if one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::RateLimitExhausted { body, .. } | ApiError::HttpStatus { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// A failure worth another attempt.
#[derive(Debug)]
pub enum RetryableFailure {
    RateLimited { body: String },
    Timeout(String),
    Connection(String),
}

impl RetryableFailure {
    /// The error reported once no attempts are left.
    pub fn exhausted(self, attempts: usize) -> ApiError {
        match self {
            RetryableFailure::RateLimited { body } => ApiError::RateLimitExhausted { attempts, body },
            RetryableFailure::Timeout(msg) => ApiError::Timeout(msg),
            RetryableFailure::Connection(msg) => ApiError::Connection(msg),
        }
    }
}

impl std::fmt::Display for RetryableFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryableFailure::RateLimited { .. } => write!(f, "HTTP 429 Too Many Requests"),
            RetryableFailure::Timeout(msg) => write!(f, "timeout: {}", msg),
            RetryableFailure::Connection(msg) => write!(f, "connection error: {}", msg),
        }
    }
}

/// Result of a single attempt. The retry loop only inspects the tag.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    Retryable(RetryableFailure),
    Terminal(ApiError),
}

/// Classifies a non-success HTTP status.
pub fn classify_status<T>(status: StatusCode, body: String) -> AttemptOutcome<T> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        AttemptOutcome::Retryable(RetryableFailure::RateLimited { body })
    } else {
        AttemptOutcome::Terminal(ApiError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }
}

/// Classifies a transport-level failure: anything that happened before a
/// status line was received, or while reading the body.
pub fn classify_transport<T>(error: &reqwest::Error) -> AttemptOutcome<T> {
    if error.is_timeout() {
        AttemptOutcome::Retryable(RetryableFailure::Timeout(error.to_string()))
    } else if error.is_builder() {
        AttemptOutcome::Terminal(ApiError::Unexpected {
            kind: "RequestBuilder".to_string(),
            detail: error.to_string(),
        })
    } else {
        AttemptOutcome::Retryable(RetryableFailure::Connection(error.to_string()))
    }
}

/// Runs `operation` until it succeeds, fails terminally, or the policy runs
/// out of attempts. The closure receives the 0-based attempt index.
pub async fn run_with_retry<T, F, Fut>(
    runtime: &dyn Runtime,
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    for attempt in 0..policy.max_attempts {
        match operation(attempt).await {
            AttemptOutcome::Success(value) => return Ok(value),
            AttemptOutcome::Terminal(e) => {
                debug!("{}: non-retryable error: {}", operation_name, e);
                return Err(e);
            }
            AttemptOutcome::Retryable(failure) => {
                if attempt + 1 >= policy.max_attempts {
                    warn!(
                        "{}: attempt {}/{} failed ({}), giving up",
                        operation_name,
                        attempt + 1,
                        policy.max_attempts,
                        failure
                    );
                    return Err(failure.exhausted(policy.max_attempts));
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                    operation_name,
                    attempt + 1,
                    policy.max_attempts,
                    failure,
                    delay.as_millis()
                );
                runtime.sleep(delay).await;
            }
        }
    }

    Err(ApiError::Unexpected {
        kind: "RetryPolicy".to_string(),
        detail: format!("{}: retry policy allows no attempts", operation_name),
    })
}
