//! Error types for recurring tasks.

use thiserror::Error;

/// Result type for task operations.
pub type TaskResult<T> = Result<T, TaskError>;

/// Task-specific errors.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The rate limiting rule cannot be evaluated
    #[error("Unsupported rate limiting rule: {0}")]
    UnsupportedRule(String),

    /// A cycle's action reported a failure
    #[error("Task action failed: {0}")]
    Action(String),

    /// No tokio runtime is available to drive the task
    #[error("No async runtime: {0}")]
    Runtime(String),

    /// The task ended without producing a summary
    #[error("Task aborted before completion")]
    Aborted,
}
