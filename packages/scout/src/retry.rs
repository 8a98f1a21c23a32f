//! Client-side retry with exponential backoff.
//!
//! Rate limits are retried a bounded number of times, honouring the
//! provider's `Retry-After` when present. Transport failures and 5xx get a
//! single retry. Everything else fails immediately.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use linkup_client::LinkupError;
use openai_client::OpenAIError;

/// How a failed attempt should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    RateLimited { retry_after: Option<Duration> },
    Transient,
    Fatal,
}

/// Errors that know whether another attempt could help.
pub trait Retryable {
    fn retry_class(&self) -> RetryClass;
}

impl Retryable for OpenAIError {
    fn retry_class(&self) -> RetryClass {
        match self {
            OpenAIError::RateLimited { retry_after } => RetryClass::RateLimited {
                retry_after: *retry_after,
            },
            e if e.is_transient() => RetryClass::Transient,
            _ => RetryClass::Fatal,
        }
    }
}

impl Retryable for LinkupError {
    fn retry_class(&self) -> RetryClass {
        match self {
            LinkupError::RateLimited => RetryClass::RateLimited { retry_after: None },
            e if e.is_transient() => RetryClass::Transient,
            _ => RetryClass::Fatal,
        }
    }
}

/// The last error after retries ran out, with the total attempt count.
#[derive(Debug)]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rate_limit_retries: u32,
    pub max_transient_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 3,
            max_transient_retries: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_rate_limit_retries: 0,
            max_transient_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before rate-limit retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds or the policy gives up.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempts = 0;
        let mut rate_limited = 0;
        let mut transient = 0;

        loop {
            attempts += 1;
            let error = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let delay = match error.retry_class() {
                RetryClass::RateLimited { retry_after }
                    if rate_limited < self.max_rate_limit_retries =>
                {
                    let delay = retry_after
                        .unwrap_or_else(|| self.backoff(rate_limited))
                        .min(self.max_delay);
                    rate_limited += 1;
                    delay
                }
                RetryClass::Transient if transient < self.max_transient_retries => {
                    transient += 1;
                    self.base_delay
                }
                _ => return Err(RetryError { error, attempts }),
            };

            tracing::warn!(
                operation,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
