//! Vikunja API client with retry logic and failure classification.

mod client;
mod retry;

pub use client::{API_VERSION, Query, REQUEST_TIMEOUT, VikunjaClient};
pub use retry::{
    ApiError, AttemptOutcome, BASE_DELAY_MS, MAX_ATTEMPTS, RetryPolicy, RetryableFailure,
    classify_status, classify_transport, run_with_retry,
};
