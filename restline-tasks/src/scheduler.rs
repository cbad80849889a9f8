//! Timer-driven scheduling of recurring task actions.

use crate::error::{TaskError, TaskResult};
use crate::options::TaskOptions;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};
use tracing::{debug, warn};

/// Action executed on every non-skipped cycle.
pub type TaskAction =
    Arc<dyn Fn(TaskContext) -> Pin<Box<dyn Future<Output = TaskResult<()>> + Send>> + Send + Sync>;

/// Wrap an async closure as a [`TaskAction`].
pub fn task_action<F, Fut>(function: F) -> TaskAction
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TaskResult<()>> + Send + 'static,
{
    Arc::new(move |ctx: TaskContext| -> Pin<Box<dyn Future<Output = TaskResult<()>> + Send>> {
        Box::pin(function(ctx))
    })
}

/// Per-cycle execution context.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Cycle number (1-based), counting skipped cycles
    pub cycle: u64,

    /// Number of cycles executed before this one
    pub executions: u64,

    /// Actual execution time
    pub execution_time: DateTime<Utc>,
}

/// Counters reported once a task finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    /// Scheduled cycles, executed or skipped
    pub cycles: u64,
    /// Cycles whose action ran
    pub executed: u64,
    /// Cycles skipped by the rate limiting rule
    pub skipped: u64,
    /// Executed cycles whose action failed
    pub failures: u64,
    /// Whether the task ended because it was stopped
    pub stopped: bool,
}

#[derive(Debug, Default)]
struct StopSignal {
    requested: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleep for `delay`, returning `true` if a stop was requested meanwhile.
    async fn sleep(&self, delay: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => self.is_requested(),
            _ = self.notify.notified() => true,
        }
    }
}

/// Handle to a scheduled task.
///
/// Dropping the handle does not stop the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    stop: Arc<StopSignal>,
    summary: watch::Receiver<Option<TaskSummary>>,
}

impl TaskHandle {
    /// Ask the task to stop before its next cycle.
    pub fn stop(&self) {
        self.stop.request();
    }

    /// Whether the task has finished.
    pub fn is_finished(&self) -> bool {
        self.summary.borrow().is_some()
    }

    /// Wait for the task to finish and return its counters.
    pub async fn finished(&self) -> TaskResult<TaskSummary> {
        let mut summary = self.summary.clone();
        let done = summary
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TaskError::Aborted)?;
        Ok(done.unwrap_or_default())
    }
}

/// Timer collaborator that repeatedly invokes a task action.
pub trait Scheduler: Send + Sync {
    /// Start a recurring task.
    fn schedule(&self, options: TaskOptions, action: TaskAction) -> TaskResult<TaskHandle>;
}

/// Scheduler running each task on its own tokio task.
///
/// Scheduling outside a tokio runtime fails with [`TaskError::Runtime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a new scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, options: TaskOptions, action: TaskAction) -> TaskResult<TaskHandle> {
        if let Some(rule) = &options.rate_limit {
            rule.validate()?;
        }
        let runtime = Handle::try_current().map_err(|e| TaskError::Runtime(e.to_string()))?;

        let stop = Arc::new(StopSignal::default());
        let (summary_tx, summary_rx) = watch::channel(None);

        debug!(
            due_time = ?options.due_time,
            interval = ?options.repeat_interval,
            repeat_times = options.repeat_times,
            rate_limited = options.rate_limit.is_some(),
            "Scheduling recurring task"
        );

        let signal = stop.clone();
        runtime.spawn(async move {
            let summary = run_cycles(options, action, &signal).await;
            debug!(?summary, "Recurring task finished");
            summary_tx.send_replace(Some(summary));
        });

        Ok(TaskHandle {
            stop,
            summary: summary_rx,
        })
    }
}

async fn run_cycles(options: TaskOptions, action: TaskAction, stop: &StopSignal) -> TaskSummary {
    let mut summary = TaskSummary::default();

    if stop.sleep(options.due_time).await {
        summary.stopped = true;
        return summary;
    }

    loop {
        summary.cycles += 1;

        let skip = options
            .rate_limit
            .as_ref()
            .is_some_and(|rule| rule.should_skip(summary.cycles));

        if skip {
            debug!(cycle = summary.cycles, "Skipping rate limited cycle");
            summary.skipped += 1;
        } else {
            let context = TaskContext {
                cycle: summary.cycles,
                executions: summary.executed,
                execution_time: Utc::now(),
            };
            summary.executed += 1;

            if let Err(e) = action(context).await {
                summary.failures += 1;
                warn!(cycle = summary.cycles, error = %e, "Recurring task cycle failed");
                if !options.continue_on_error {
                    break;
                }
            }
        }

        if options.repeat_times > 0 && summary.cycles >= u64::from(options.repeat_times) {
            break;
        }

        if stop.sleep(options.repeat_interval).await {
            summary.stopped = true;
            break;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitRule;
    use std::sync::atomic::AtomicU64;

    fn counting_action(counter: Arc<AtomicU64>) -> TaskAction {
        task_action(move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_requested_number_of_cycles() {
        let counter = Arc::new(AtomicU64::new(0));
        let options = TaskOptions::every(Duration::from_secs(1)).repeat_times(3);

        let handle = TokioScheduler::new()
            .schedule(options, counting_action(counter.clone()))
            .unwrap();
        let summary = handle.finished().await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.executed, 3);
        assert!(!summary.stopped);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_failure_without_continue_on_error() {
        let options = TaskOptions::every(Duration::from_secs(1)).repeat_times(5);
        let action = task_action(|_ctx| async { Err(TaskError::Action("boom".to_string())) });

        let handle = TokioScheduler::new().schedule(options, action).unwrap();
        let summary = handle.finished().await.unwrap();

        assert_eq!(summary.executed, 1);
        assert_eq!(summary.failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_continue_on_error_keeps_cycling() {
        let options = TaskOptions::every(Duration::from_secs(1))
            .repeat_times(4)
            .continue_on_error(true);
        let action = task_action(|_ctx| async { Err(TaskError::Action("boom".to_string())) });

        let handle = TokioScheduler::new().schedule(options, action).unwrap();
        let summary = handle.finished().await.unwrap();

        assert_eq!(summary.executed, 4);
        assert_eq!(summary.failures, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_cycles_are_skipped() {
        let counter = Arc::new(AtomicU64::new(0));
        let options = TaskOptions::every(Duration::from_secs(1))
            .repeat_times(6)
            .rate_limit(RateLimitRule::by_percent(50.0));

        let handle = TokioScheduler::new()
            .schedule(options, counting_action(counter.clone()))
            .unwrap();
        let summary = handle.finished().await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(summary.skipped, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_unbounded_task() {
        let counter = Arc::new(AtomicU64::new(0));
        let options = TaskOptions::every(Duration::from_secs(10));

        let handle = TokioScheduler::new()
            .schedule(options, counting_action(counter.clone()))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        handle.stop();
        let summary = handle.finished().await.unwrap();

        assert!(summary.stopped);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_schedule_outside_runtime_is_an_error() {
        let options = TaskOptions::every(Duration::from_secs(1)).repeat_times(1);
        let result = TokioScheduler::new().schedule(options, task_action(|_| async { Ok(()) }));
        assert!(matches!(result, Err(TaskError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_invalid_rule_is_rejected() {
        let options = TaskOptions::every(Duration::from_secs(1))
            .rate_limit(RateLimitRule::by_percent(0.0));
        let result = TokioScheduler::new().schedule(options, task_action(|_| async { Ok(()) }));
        assert!(matches!(result, Err(TaskError::UnsupportedRule(_))));
    }
}
