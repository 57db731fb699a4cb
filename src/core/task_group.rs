use crate::core::context::RequestContext;
use crate::error::{AppError, Result};
use std::any::Any;
use std::future::Future;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn, Instrument, Level};

/// Group of spawned tasks whose first failure is reported by [`wait`].
///
/// A panicking task is turned into [`AppError::TaskPanicked`] rather than
/// tearing down the caller. Failures do not cancel the other tasks; cancel the
/// shared [`RequestContext`] for that.
///
/// [`wait`]: TaskGroup::wait
pub struct TaskGroup {
    tasks: JoinSet<Result<()>>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    /// Spawn `task` on the current tokio runtime.
    ///
    /// If `ctx` is cancelled before the task finishes, the task is dropped and
    /// counts as failed.
    pub fn run<F>(&mut self, ctx: &RequestContext, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let ctx = ctx.clone();
        let span = ctx.span();

        self.tasks.spawn(
            async move {
                tokio::select! {
                    result = task => result,
                    _ = ctx.cancelled() => Err(AppError::TaskFailed("cancelled".to_string())),
                }
            }
            .instrument(span),
        );
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every task and return the first error, in completion order.
    pub async fn wait(mut self) -> Result<()> {
        let mut first_error = None;

        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(join_error(e)));

            if let Err(err) = outcome {
                if failure_level(&err) == Level::ERROR {
                    error!(error = %err, "Task in group hit a bug");
                } else {
                    warn!(error = %err, "Task in group failed");
                }
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// Bugs (panics, type mismatches) are logged at error, everything else at warn.
fn failure_level(err: &AppError) -> Level {
    if err.is_programmer_error() {
        Level::ERROR
    } else {
        Level::WARN
    }
}

fn join_error(err: JoinError) -> AppError {
    if err.is_panic() {
        AppError::TaskPanicked(panic_message(err.into_panic()))
    } else {
        AppError::TaskFailed(err.to_string())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
