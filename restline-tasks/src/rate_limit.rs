//! Rate limiting rules for recurring tasks.
//!
//! A rule is consulted once per scheduled cycle and decides whether that
//! cycle's action is skipped.
//!
//! - [`RateLimitRule::ByPercent`] runs a fixed share of cycles. Cycle `n`
//!   (1-based) runs when `floor(n * p / 100)` exceeds `floor((n - 1) * p / 100)`,
//!   so 50% runs cycles 2, 4, 6 and 100% runs every cycle.
//! - [`RateLimitRule::ByPredicate`] samples a caller-supplied status and skips
//!   the cycle while the predicate reports the status as limited.

use crate::error::{TaskError, TaskResult};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Which rate limiting variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitType {
    /// Run a fixed percentage of cycles.
    ByPercent,
    /// Skip cycles while a predicate holds.
    ByPredicate,
}

/// Type-erased predicate check.
pub trait RateLimitCheck: Send + Sync {
    /// Whether the current cycle should be skipped.
    fn is_limited(&self) -> bool;
}

struct PredicateRule<S, G, P> {
    status: G,
    predicate: P,
    _status: PhantomData<fn() -> S>,
}

impl<S, G, P> RateLimitCheck for PredicateRule<S, G, P>
where
    G: Fn() -> S + Send + Sync,
    P: Fn(&S) -> bool + Send + Sync,
{
    fn is_limited(&self) -> bool {
        let status = (self.status)();
        (self.predicate)(&status)
    }
}

/// Rule gating whether a scheduled cycle executes.
#[derive(Clone)]
pub enum RateLimitRule {
    /// Percentage of cycles allowed to run, in `(0, 100]`.
    ByPercent(f64),
    /// Predicate over a sampled status.
    ByPredicate(Arc<dyn RateLimitCheck>),
}

impl RateLimitRule {
    /// Allow `percent` of cycles to run.
    pub fn by_percent(percent: f64) -> Self {
        Self::ByPercent(percent)
    }

    /// Skip cycles while `predicate(status())` is true.
    ///
    /// The status type is fixed at compile time and erased behind the rule.
    pub fn by_predicate<S, G, P>(status: G, predicate: P) -> Self
    where
        S: 'static,
        G: Fn() -> S + Send + Sync + 'static,
        P: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::ByPredicate(Arc::new(PredicateRule {
            status,
            predicate,
            _status: PhantomData,
        }))
    }

    /// The active variant.
    pub fn rate_limit_type(&self) -> RateLimitType {
        match self {
            Self::ByPercent(_) => RateLimitType::ByPercent,
            Self::ByPredicate(_) => RateLimitType::ByPredicate,
        }
    }

    /// Reject rules that cannot be evaluated.
    pub fn validate(&self) -> TaskResult<()> {
        match self {
            Self::ByPercent(percent) if !percent.is_finite() || *percent <= 0.0 || *percent > 100.0 => {
                Err(TaskError::UnsupportedRule(format!(
                    "rate limit percent must be within (0, 100], got {percent}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Whether cycle `cycle` (1-based) is skipped under this rule.
    pub fn should_skip(&self, cycle: u64) -> bool {
        match self {
            Self::ByPercent(percent) => {
                let share = |n: u64| (n as f64 * percent / 100.0).floor();
                share(cycle) <= share(cycle.saturating_sub(1))
            }
            Self::ByPredicate(check) => check.is_limited(),
        }
    }
}

impl fmt::Debug for RateLimitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByPercent(percent) => f.debug_tuple("ByPercent").field(percent).finish(),
            Self::ByPredicate(_) => f.write_str("ByPredicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_percent_half_runs_every_other_cycle() {
        let rule = RateLimitRule::by_percent(50.0);
        let ran: Vec<u64> = (1..=6).filter(|c| !rule.should_skip(*c)).collect();
        assert_eq!(ran, vec![2, 4, 6]);
    }

    #[test]
    fn test_percent_full_runs_every_cycle() {
        let rule = RateLimitRule::by_percent(100.0);
        assert!((1..=10).all(|c| !rule.should_skip(c)));
    }

    #[test]
    fn test_percent_validation() {
        assert!(RateLimitRule::by_percent(25.0).validate().is_ok());
        assert!(RateLimitRule::by_percent(0.0).validate().is_err());
        assert!(RateLimitRule::by_percent(150.0).validate().is_err());
        assert!(RateLimitRule::by_percent(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_predicate_samples_status_each_cycle() {
        let remaining = Arc::new(AtomicU32::new(2));
        let source = remaining.clone();
        let rule = RateLimitRule::by_predicate(
            move || source.load(Ordering::SeqCst),
            |remaining: &u32| *remaining == 0,
        );

        assert_eq!(rule.rate_limit_type(), RateLimitType::ByPredicate);
        assert!(!rule.should_skip(1));
        remaining.store(0, Ordering::SeqCst);
        assert!(rule.should_skip(2));
    }

    #[test]
    fn test_debug_output() {
        assert_eq!(format!("{:?}", RateLimitRule::by_percent(10.0)), "ByPercent(10.0)");
        let rule = RateLimitRule::by_predicate(|| (), |_| false);
        assert_eq!(format!("{rule:?}"), "ByPredicate(..)");
    }
}
