//! Retry policy and the per-call retry controller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::result::QueryResult;

type RetryPredicate = Arc<dyn Fn(&TransportError) -> bool + Send + Sync>;

/// A predicate deciding whether an attempt error deserves a retry.
#[derive(Clone)]
pub struct RetryCondition {
    label: String,
    predicate: RetryPredicate,
}

impl RetryCondition {
    /// Create a condition from a closure.
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&TransportError) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Retry on timeouts.
    pub fn on_timeout() -> Self {
        Self::new("timeout", TransportError::is_timeout)
    }

    /// Retry on connection failures.
    pub fn on_connection_failure() -> Self {
        Self::new("connection", TransportError::is_connection)
    }

    /// Retry when the server answers with one of `codes`.
    pub fn on_status(codes: impl IntoIterator<Item = u16>) -> Self {
        let codes: Vec<u16> = codes.into_iter().collect();
        Self::new(format!("status {codes:?}"), move |error| {
            error.status_code().is_some_and(|s| codes.contains(&s))
        })
    }

    /// Retry on any error.
    pub fn on_any_error() -> Self {
        Self::new("any", |_| true)
    }

    /// Retry on timeouts, connection failures, 408, 429 and 5xx.
    pub fn on_retryable() -> Self {
        Self::new("retryable", TransportError::is_retryable)
    }

    /// Evaluate the condition.
    pub fn retry_if(&self, error: &TransportError) -> bool {
        (self.predicate)(error)
    }

    /// Human readable name.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetryCondition").field(&self.label).finish()
    }
}

/// Retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub retry_count: u32,
    /// Conditions, OR-combined.
    pub conditions: Vec<RetryCondition>,
    /// Delay between attempts.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Policy with `retry_count` retries, no conditions and no delay.
    pub fn new(retry_count: u32) -> Self {
        Self {
            retry_count,
            conditions: Vec::new(),
            backoff: BackoffStrategy::None,
        }
    }

    /// Add a retry condition.
    pub fn retry_if(mut self, condition: RetryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether an attempt that ended with `error` should be retried.
    ///
    /// Every condition is evaluated; the answers are OR-combined.
    pub fn should_retry(&self, error: Option<&TransportError>) -> bool {
        let Some(error) = error else {
            return false;
        };
        self.conditions
            .iter()
            .fold(false, |retry, condition| condition.retry_if(error) | retry)
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, Default)]
pub enum BackoffStrategy {
    /// No delay between retries.
    #[default]
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Delay grows by a fixed amount per retry.
    Linear {
        /// Delay increment per retry.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Delay multiplies per retry.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => delay.saturating_mul(retry.saturating_add(1)).min(*max),
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(retry.min(i32::MAX as u32) as i32);
                let millis = initial.as_millis() as f64 * factor;
                if millis.is_finite() && millis < max.as_millis() as f64 {
                    Duration::from_millis(millis as u64)
                } else {
                    *max
                }
            }
        }
    }
}

/// What to do after an attempt.
#[derive(Debug)]
pub(crate) enum Step {
    /// Issue another attempt after `delay`.
    Retry { delay: Duration },
    /// The call is over; this is the terminal result.
    Stop(QueryResult),
}

/// Budget and result chain of one logical call.
#[derive(Debug)]
pub(crate) struct RetryController {
    remaining: u32,
    attempts: u32,
    previous: Option<QueryResult>,
}

impl RetryController {
    /// Budget for awaited calls: every retry plus the first attempt.
    pub(crate) fn sequential(policy: Option<&RetryPolicy>) -> Self {
        Self::with_budget(policy.map_or(0, |p| p.retry_count).saturating_add(1))
    }

    /// Budget for callback calls: the first attempt is not counted.
    pub(crate) fn evented(policy: Option<&RetryPolicy>) -> Self {
        Self::with_budget(policy.map_or(0, |p| p.retry_count))
    }

    fn with_budget(remaining: u32) -> Self {
        Self {
            remaining,
            attempts: 0,
            previous: None,
        }
    }

    /// Attempts observed so far.
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a finished attempt and decide whether to go again.
    pub(crate) fn on_attempt(&mut self, policy: Option<&RetryPolicy>, result: QueryResult) -> Step {
        self.attempts += 1;
        let current = result.link(self.previous.take());
        let retry = policy.is_some_and(|p| p.should_retry(current.error()));

        if retry {
            self.remaining = self.remaining.saturating_sub(1);
        } else {
            self.remaining = 0;
        }

        if self.remaining > 0 {
            let delay = policy.map_or(Duration::ZERO, |p| {
                p.backoff.delay_for_retry(self.attempts - 1)
            });
            debug!(
                attempt = self.attempts,
                remaining = self.remaining,
                error = ?current.error(),
                "Retrying request due to error"
            );
            self.previous = Some(current);
            Step::Retry { delay }
        } else {
            if retry {
                warn!(attempts = self.attempts, error = ?current.error(), "Retries exhausted");
            }
            Step::Stop(current)
        }
    }
}
