//! Recurring task scheduling for restline.
//!
//! Provides the timer collaborator used by the client's recurring requests:
//! - Due time, repeat interval and repeat count
//! - Continue-on-error control
//! - Optional rate limiting by percentage or by predicate
//! - Stop handles and per-task summaries
//!
//! ## Quick Start
//!
//! ```no_run
//! use restline_tasks::*;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), TaskError> {
//! let options = TaskOptions::every(Duration::from_secs(30))
//!     .repeat_times(10)
//!     .rate_limit(RateLimitRule::by_percent(50.0));
//!
//! let handle = TokioScheduler::new().schedule(
//!     options,
//!     task_action(|ctx| async move {
//!         println!("cycle {}", ctx.cycle);
//!         Ok(())
//!     }),
//! )?;
//!
//! let summary = handle.finished().await?;
//! println!("ran {} of {} cycles", summary.executed, summary.cycles);
//! # Ok(())
//! # }
//! ```

mod error;
mod options;
mod rate_limit;
mod scheduler;

pub use error::{TaskError, TaskResult};
pub use options::TaskOptions;
pub use rate_limit::{RateLimitCheck, RateLimitRule, RateLimitType};
pub use scheduler::{
    Scheduler, TaskAction, TaskContext, TaskHandle, TaskSummary, TokioScheduler, task_action,
};
