//! Registry of detached background tasks.
//!
//! Startup work that nobody awaits (the download agent, the library upload)
//! still needs its errors and panics reported. Every detached task goes
//! through [`DetachedTasks::spawn`]; errors are logged and counted when the
//! task finishes, panics when the registry is drained.

use crate::error::LaunchResult;
use crate::metrics::DETACHED_TASK_FAILURES;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Final state of a drained task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// Finished, with or without an error (errors are reported on exit).
    Finished,
    Panicked,
    Cancelled,
}

#[derive(Clone, Default)]
pub struct DetachedTasks {
    tasks: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
}

impl DetachedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a detached task. Its error, if any, goes to the log and the
    /// failure counter; it never reaches the caller.
    pub fn spawn<F>(&self, name: &'static str, fut: F)
    where
        F: Future<Output = LaunchResult<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match fut.await {
                Ok(()) => tracing::debug!(task = name, "Detached task completed"),
                Err(e) => {
                    DETACHED_TASK_FAILURES.with_label_values(&[name, "error"]).inc();
                    tracing::error!(task = name, error = %e, "Detached task failed");
                }
            }
        });

        match self.tasks.lock() {
            Ok(mut tasks) => tasks.push((name, handle)),
            Err(poisoned) => poisoned.into_inner().push((name, handle)),
        }
    }

    /// Number of tasks not yet drained.
    pub fn len(&self) -> usize {
        match self.tasks.lock() {
            Ok(tasks) => tasks.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every task to finish and collect how each one ended.
    pub async fn wait(&self) -> Vec<(&'static str, TaskExit)> {
        self.drain(false).await
    }

    /// Abort unfinished tasks and collect how every task ended.
    ///
    /// Finished tasks are reported as is; running ones are aborted and
    /// reported as cancelled.
    pub async fn shutdown(&self) -> Vec<(&'static str, TaskExit)> {
        self.drain(true).await
    }

    async fn drain(&self, abort: bool) -> Vec<(&'static str, TaskExit)> {
        let handles = {
            let mut tasks = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *tasks)
        };

        let mut exits = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            if abort && !handle.is_finished() {
                handle.abort();
            }
            let exit = match handle.await {
                Ok(()) => TaskExit::Finished,
                Err(join_err) if join_err.is_panic() => {
                    DETACHED_TASK_FAILURES.with_label_values(&[name, "panic"]).inc();
                    tracing::error!(task = name, panic = ?join_err, "Detached task panicked");
                    TaskExit::Panicked
                }
                Err(_) => {
                    tracing::debug!(task = name, "Detached task cancelled");
                    TaskExit::Cancelled
                }
            };
            exits.push((name, exit));
        }
        exits
    }
}
