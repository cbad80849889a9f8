//! Recurring callback-style calls.

use restline_tasks::{Scheduler, TaskContext, TaskError, TaskOptions, task_action};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{ClientError, Result};
use crate::orchestrator::{AsyncCall, AsyncHandle, CallOutcome, Completion};
use crate::resolve::ResolvedConfig;

/// Task options of a call, if they describe a recurring task.
pub(crate) fn recurring_options(config: &ResolvedConfig) -> Option<TaskOptions> {
    config
        .task_options
        .as_ref()
        .filter(|options| options.is_recurring())
        .cloned()
}

/// Hand `call` to `scheduler`, running a full retry sequence every cycle.
pub(crate) fn begin<T: Send + 'static>(
    scheduler: &dyn Scheduler,
    call: AsyncCall<T>,
    options: TaskOptions,
) -> Result<AsyncHandle> {
    if let Some(rule) = &options.rate_limit {
        rule.validate()
            .map_err(|e| ClientError::UnsupportedConfiguration(e.to_string()))?;
        debug!(rule = ?rule.rate_limit_type(), "Rate limiting recurring request");
    }

    let call = Arc::new(call);
    let action = task_action(move |ctx: TaskContext| {
        let call = call.clone();
        async move {
            trace!(cycle = ctx.cycle, "Running recurring request");
            match call.run().await {
                CallOutcome::Succeeded => Ok(()),
                CallOutcome::Failed => Err(TaskError::Action(format!(
                    "request failed in cycle {}",
                    ctx.cycle
                ))),
                CallOutcome::Abandoned => Err(TaskError::Aborted),
            }
        }
    });

    let task = scheduler.schedule(options, action)?;

    let (completion, completed) = Completion::channel();
    let watcher = task.clone();
    tokio::spawn(async move {
        match watcher.finished().await {
            Ok(summary) => debug!(?summary, "Recurring request finished"),
            Err(e) => debug!(error = %e, "Recurring request ended abnormally"),
        }
        completion.signal();
    });

    Ok(AsyncHandle::new(completed, Some(task)))
}
