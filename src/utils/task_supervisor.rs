use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use crate::error::{Error, Result};
use crate::observability::metrics::ACTIVE_TASKS;

/// Task Supervisor - Runs the tasks of one pipeline run as a single group
///
/// ## Purpose
/// Every task shares one cancellation token, a child of the caller's token.
/// The first task to fail records its error and cancels the token. The other
/// tasks observe the cancellation at their next queue operation and unwind.
///
/// ## Usage
/// ```rust,ignore
/// let mut supervisor = TaskSupervisor::new(&parent);
///
/// let token = supervisor.token();
/// supervisor.spawn("extraction", async move {
///     // task logic, returning Result<()>
/// });
///
/// // Returns the first error recorded by any task
/// supervisor.wait().await?;
/// ```
pub struct TaskSupervisor {
    token: CancellationToken,
    first_error: Arc<Mutex<Option<Error>>>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl TaskSupervisor {
    pub fn new(parent: &CancellationToken) -> Self {
        TaskSupervisor {
            token: parent.child_token(),
            first_error: Arc::new(Mutex::new(None)),
            tasks: Vec::new(),
        }
    }

    /// Token shared by every task of the group.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a task and register it with the group
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        let token = self.token.clone();
        let first_error = Arc::clone(&self.first_error);

        ACTIVE_TASKS.inc();
        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(future).catch_unwind().await;
            ACTIVE_TASKS.dec();

            let err = match outcome {
                Ok(Ok(())) => {
                    debug!("Task {} finished", task_name);
                    return;
                }
                Ok(Err(e)) => e,
                Err(_) => Error::TaskPanicked(task_name.clone()),
            };

            if err.is_cancellation() {
                debug!("Task {} cancelled", task_name);
            } else {
                error!("Task {} failed: {}", task_name, err);
            }

            record_error(&first_error, err);
            token.cancel();
        });

        info!("Spawned pipeline task: {}", name);
        self.tasks.push((name, handle));
        self
    }

    /// Get count of registered tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every task to exit and return the first recorded error
    pub async fn wait(self) -> Result<()> {
        info!("Waiting for {} pipeline tasks", self.tasks.len());

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                // Only reachable if the runtime aborted the task
                record_error(&self.first_error, Error::TaskPanicked(format!("{}: {}", name, e)));
                self.token.cancel();
            }
        }

        let first = match self.first_error.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn record_error(slot: &Mutex<Option<Error>>, err: Error) {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    // A failing task may cancel the group before its error is recorded, so a
    // real failure still replaces a cancellation recorded ahead of it.
    let replace = match guard.as_ref() {
        None => true,
        Some(recorded) => recorded.is_cancellation() && !err.is_cancellation(),
    };

    if replace {
        *guard = Some(err);
    }
}
