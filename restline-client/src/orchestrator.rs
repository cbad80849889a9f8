//! Callback-style calls.
//!
//! Every attempt runs on its own tokio task and reports back over a oneshot
//! channel. The driver feeds each report to the retry controller and either
//! issues a continuation attempt or builds the response and fires the
//! callback, exactly once per logical call.

use restline_tasks::TaskHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{trace, warn};

use crate::call::PreparedCall;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use crate::result::QueryResult;
use crate::retry::{RetryController, Step};

/// Callback receiving the outcome of a callback-style call.
pub type Callback<T> = Arc<dyn Fn(&Request, Result<Response<T>>) + Send + Sync>;

pub(crate) type ResponseFactory<T> =
    Arc<dyn Fn(&PreparedCall, QueryResult) -> Result<Response<T>> + Send + Sync>;

/// Handle to a callback-style call.
#[derive(Debug, Clone)]
pub struct AsyncHandle {
    completed: watch::Receiver<bool>,
    task: Option<TaskHandle>,
}

impl AsyncHandle {
    pub(crate) fn new(completed: watch::Receiver<bool>, task: Option<TaskHandle>) -> Self {
        Self { completed, task }
    }

    /// Whether the call has finished.
    ///
    /// One-shot calls finish after their callback fires; recurring calls
    /// finish when their task ends.
    pub fn is_completed(&self) -> bool {
        *self.completed.borrow()
    }

    /// Wait until the call has finished.
    pub async fn wait(&self) {
        let mut completed = self.completed.clone();
        if completed.wait_for(|done| *done).await.is_err() {
            warn!("Call ended without signalling completion");
        }
    }

    /// Task driving a recurring call.
    pub fn task(&self) -> Option<&TaskHandle> {
        self.task.as_ref()
    }

    /// Stop a recurring call before its next cycle. No effect on one-shot calls.
    pub fn stop(&self) {
        if let Some(task) = &self.task {
            task.stop();
        }
    }
}

pub(crate) struct Completion(watch::Sender<bool>);

impl Completion {
    pub(crate) fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self(tx), rx)
    }

    pub(crate) fn signal(self) {
        self.0.send_replace(true);
    }
}

/// How a logical call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallOutcome {
    Succeeded,
    Failed,
    Abandoned,
}

enum Attempt {
    Original,
    Continuation { delay: Duration },
}

pub(crate) struct AsyncCall<T> {
    request: Arc<Request>,
    call: Arc<PreparedCall>,
    build: ResponseFactory<T>,
    callback: Callback<T>,
}

impl<T: Send + 'static> AsyncCall<T> {
    pub(crate) fn new(
        request: Arc<Request>,
        call: Arc<PreparedCall>,
        build: ResponseFactory<T>,
        callback: Callback<T>,
    ) -> Self {
        Self {
            request,
            call,
            build,
            callback,
        }
    }

    /// Issue the original attempt and drive the call in the background.
    pub(crate) fn begin(self) -> AsyncHandle {
        let (completion, completed) = Completion::channel();
        let first = self.issue(Attempt::Original);
        tokio::spawn(async move {
            self.drive(first).await;
            completion.signal();
        });
        AsyncHandle::new(completed, None)
    }

    /// Run one logical call, callback included, to its end.
    pub(crate) async fn run(&self) -> CallOutcome {
        let first = self.issue(Attempt::Original);
        self.drive(first).await
    }

    async fn drive(&self, mut pending: oneshot::Receiver<QueryResult>) -> CallOutcome {
        let policy = self.call.config.retry_policy.as_ref();
        let mut controller = RetryController::evented(policy);

        loop {
            let Ok(result) = pending.await else {
                warn!(url = %self.call.url, "Attempt ended without reporting a result");
                return CallOutcome::Abandoned;
            };

            match controller.on_attempt(policy, result) {
                Step::Retry { delay } => pending = self.issue(Attempt::Continuation { delay }),
                Step::Stop(terminal) => return self.complete(terminal),
            }
        }
    }

    fn issue(&self, attempt: Attempt) -> oneshot::Receiver<QueryResult> {
        let (tx, rx) = oneshot::channel();
        let call = self.call.clone();

        tokio::spawn(async move {
            let continuation = match attempt {
                Attempt::Original => false,
                Attempt::Continuation { delay } => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    true
                }
            };

            let mut query = call.query.clone();
            let result = call.attempt(&mut query, continuation).await;
            if tx.send(result).is_err() {
                trace!("Attempt finished after its call was dropped");
            }
        });

        rx
    }

    fn complete(&self, terminal: QueryResult) -> CallOutcome {
        let failed = terminal.error().is_some();
        let response = (self.build)(&self.call, terminal);

        let outcome = match &response {
            Ok(_) if !failed => CallOutcome::Succeeded,
            Ok(_) => CallOutcome::Failed,
            Err(e) => {
                warn!(error = %e, "Failed to build response");
                CallOutcome::Failed
            }
        };

        (self.callback)(&self.request, response);
        outcome
    }
}
