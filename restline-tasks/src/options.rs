//! Recurring task options.

use crate::rate_limit::RateLimitRule;
use std::time::Duration;

/// Timing and failure options for a recurring task.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Delay before the first cycle.
    pub due_time: Duration,
    /// Delay between cycles. A zero interval disables recurrence.
    pub repeat_interval: Duration,
    /// Number of cycles to run; `0` repeats until stopped.
    pub repeat_times: u32,
    /// Keep cycling after a cycle reports a failure.
    pub continue_on_error: bool,
    /// Optional rule deciding whether a cycle is skipped.
    pub rate_limit: Option<RateLimitRule>,
}

impl TaskOptions {
    /// Options repeating every `interval`, starting immediately.
    pub fn every(interval: Duration) -> Self {
        Self {
            repeat_interval: interval,
            ..Default::default()
        }
    }

    /// Set the delay before the first cycle.
    pub fn due_time(mut self, due_time: Duration) -> Self {
        self.due_time = due_time;
        self
    }

    /// Set how many cycles to run.
    pub fn repeat_times(mut self, times: u32) -> Self {
        self.repeat_times = times;
        self
    }

    /// Keep running after failed cycles.
    pub fn continue_on_error(mut self, enable: bool) -> Self {
        self.continue_on_error = enable;
        self
    }

    /// Attach a rate limiting rule.
    pub fn rate_limit(mut self, rule: RateLimitRule) -> Self {
        self.rate_limit = Some(rule);
        self
    }

    /// Whether these options describe a recurring task.
    pub fn is_recurring(&self) -> bool {
        !self.repeat_interval.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_is_not_recurring() {
        assert!(!TaskOptions::default().is_recurring());
        assert!(TaskOptions::every(Duration::from_millis(1)).is_recurring());
    }

    #[test]
    fn test_builder() {
        let options = TaskOptions::every(Duration::from_secs(5))
            .due_time(Duration::from_secs(1))
            .repeat_times(3)
            .continue_on_error(true);

        assert_eq!(options.repeat_interval, Duration::from_secs(5));
        assert_eq!(options.due_time, Duration::from_secs(1));
        assert_eq!(options.repeat_times, 3);
        assert!(options.continue_on_error);
        assert!(options.rate_limit.is_none());
    }
}
