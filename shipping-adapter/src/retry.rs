//! Retry policy - bounded retries with linear backoff for transient gRPC failures

use crate::context::CallContext;
use crate::metrics::SHIPPING_ATTEMPTS_TOTAL;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tonic::{Code, Status};
use tracing::{debug, info, warn};

/// Codes retried by default: the transient ones
pub const DEFAULT_RETRYABLE_CODES: [Code; 3] =
    [Code::DeadlineExceeded, Code::ResourceExhausted, Code::Unavailable];

/// Backoff schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry `n` waits `n * step`
    Linear {
        /// Increment per retry
        step: Duration,
    },
    /// Every retry waits the same delay
    Constant {
        /// Delay
        delay: Duration,
    },
}

impl Backoff {
    /// Delay before retry `retry` (1-based). No jitter.
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::Linear { step } => step.saturating_mul(retry),
            Backoff::Constant { delay } => delay,
        }
    }
}

/// Which failures are retried, how often and how far apart
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retryable_codes: Vec<Code>,
    max_retries: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retryable_codes: DEFAULT_RETRYABLE_CODES.to_vec(),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            backoff: Backoff::Linear {
                step: Duration::from_secs(crate::DEFAULT_BACKOFF_STEP_SECONDS),
            },
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default retryable codes
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
            ..Self::default()
        }
    }

    /// Replace the retryable code set
    pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = Code>) -> Self {
        self.retryable_codes = codes.into_iter().collect();
        self
    }

    /// Retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff schedule
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether a failure with this code is retried
    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(&code)
    }

    /// Run `call` until it succeeds, fails terminally, runs out of attempts or
    /// `ctx` is done.
    ///
    /// `call` receives the 0-based attempt number. The context is checked before
    /// every attempt and raced against both the attempt and the backoff wait, so
    /// cancelling it stops the whole sequence. Transport failures are returned
    /// as `Error::Transport` with the last status untouched.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &CallContext,
        operation_name: &str,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, Status>>,
    {
        let mut attempt: u32 = 0;

        loop {
            if let Some(reason) = ctx.err() {
                debug!(
                    "{} abandoned before attempt {}: {:?}",
                    operation_name,
                    attempt + 1,
                    reason
                );
                return Err(reason.into());
            }

            let outcome = tokio::select! {
                biased;
                reason = ctx.done() => {
                    debug!(
                        "{} abandoned during attempt {}: {:?}",
                        operation_name,
                        attempt + 1,
                        reason
                    );
                    return Err(reason.into());
                }
                outcome = call(attempt) => outcome,
            };

            let status = match outcome {
                Ok(value) => {
                    SHIPPING_ATTEMPTS_TOTAL.with_label_values(&["Ok"]).inc();
                    if attempt > 0 {
                        info!(
                            "{} succeeded on attempt {}/{}",
                            operation_name,
                            attempt + 1,
                            self.max_attempts()
                        );
                    }
                    return Ok(value);
                }
                Err(status) => status,
            };

            let code_label = format!("{:?}", status.code());
            SHIPPING_ATTEMPTS_TOTAL
                .with_label_values(&[code_label.as_str()])
                .inc();

            // A failure caused by the context running out is reported as such
            if let Some(reason) = ctx.err() {
                debug!("{} failed after context ended: {:?}", operation_name, reason);
                return Err(reason.into());
            }

            if !self.is_retryable(status.code()) {
                warn!(
                    "Non-retryable error for {}: {:?} {}",
                    operation_name,
                    status.code(),
                    status.message()
                );
                return Err(Error::Transport(status));
            }

            if attempt >= self.max_retries {
                warn!(
                    "{} failed after {} attempts: {:?} {}",
                    operation_name,
                    attempt + 1,
                    status.code(),
                    status.message()
                );
                return Err(Error::Transport(status));
            }

            attempt += 1;
            let delay = self.backoff.delay(attempt);
            warn!(
                "Retry attempt {}/{} for {} after {:?} ({:?})",
                attempt,
                self.max_retries,
                operation_name,
                delay,
                status.code()
            );

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    debug!("{} abandoned during backoff: {:?}", operation_name, reason);
                    return Err(reason.into());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
