//! Bounded retry with a fixed delay for resolution and download steps.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying errors and determining retry behavior.
//!
//! # Overview
//!
//! When an operation fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - network errors, HTTP error statuses and
//!   not-found results, which may succeed once the archive catches up
//! - [`FailureType::Permanent`] - everything else (timeouts, IO, validation)
//!
//! [`RetryPolicy::run`] is the single place where an exhausted HTTP 404 is
//! turned into [`FetchError::NotFound`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use buildfetch_core::download::{RetryDecision, RetryPolicy, FailureType};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(10));
//!
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::error::FetchError;

/// Default number of attempts (0 and 1 both mean a single attempt).
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 0;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

const EXHAUSTED_404_MESSAGE: &str = "Specified build has not been found";

/// Classification of failures for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: connection refused, HTTP 5xx, HTTP 404, build folder not yet listed.
    Transient,

    /// Failure that won't change on retry.
    ///
    /// Examples: download timeout, disk error, malformed build id.
    Permanent,
}

/// Decision on whether to retry a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the operation.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Retry configuration: a bounded number of attempts with a fixed delay.
///
/// `max_attempts` counts every attempt including the first one; `0` and `1`
/// both mean exactly one attempt with no sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn single_attempt() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Returns the configured maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts.max(1)),
            };
        }

        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }

    /// Runs `operation` until it succeeds or the policy gives up.
    ///
    /// The last failure is returned unchanged, except that an HTTP 404 is
    /// reported as [`FetchError::NotFound`] carrying the requested URL.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match self.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(operation = label, attempt, error = %error, "attempt failed");
                    info!(
                        operation = label,
                        delay_secs = delay.as_secs_f64(),
                        next_attempt = next,
                        "will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(operation = label, attempt, reason = %reason, "giving up");
                    return Err(normalize_exhausted(error));
                }
            }
        }
    }
}

/// Classifies an error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | Network | Transient |
/// | HttpStatus (any) | Transient |
/// | NotFound | Transient |
/// | Timeout | Permanent |
/// | Io, InvalidUrl, validation, NotSupported, NotImplemented, checksum | Permanent |
#[must_use]
pub fn classify_error(error: &FetchError) -> FailureType {
    match error {
        FetchError::Network { .. }
        | FetchError::HttpStatus { .. }
        | FetchError::NotFound { .. } => FailureType::Transient,
        FetchError::Timeout { .. }
        | FetchError::Io { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::InvalidInput { .. }
        | FetchError::MissingField { .. }
        | FetchError::NotSupported { .. }
        | FetchError::NotImplemented { .. }
        | FetchError::ChecksumMismatch { .. } => FailureType::Permanent,
    }
}

fn normalize_exhausted(error: FetchError) -> FetchError {
    match error {
        FetchError::HttpStatus { url, status: 404 } => {
            FetchError::not_found(EXHAUSTED_404_MESSAGE, url)
        }
        other => other,
    }
}
