use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};

use futures::future::{join_all, FutureExt};
use thiserror::Error;
use tracing::{debug, warn};

/// Concurrency ceiling used when none is configured
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Placeholder stored in a task's slot when it failed or panicked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type TaskOutcome<T> = Result<T, TaskError>;

/// Runs a list of tasks with at most `concurrency` in flight.
///
/// Workers are plain futures joined on the caller's task, so concurrency is
/// cooperative: nothing is spawned and no thread is started per task. Each
/// worker claims the next unclaimed index from one shared queue until it is
/// empty. Results come back in input order whatever order they finish in, and a
/// failing or panicking task only affects its own slot.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRunner {
    concurrency: usize,
}

impl Default for BoundedRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BoundedRunner {
    /// A ceiling of zero is treated as one.
    pub fn new(concurrency: usize) -> Self {
        if concurrency == 0 {
            warn!("Concurrency of 0 requested, running tasks one at a time");
        }

        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run<T, E, F, Fut>(&self, tasks: Vec<F>) -> Vec<TaskOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total = tasks.len();

        if total == 0 {
            return Vec::new();
        }

        let workers = self.concurrency.min(total);
        debug!(tasks = total, workers, "Running bounded task batch");

        let queue = Mutex::new(tasks.into_iter().enumerate());
        let finished = join_all((0..workers).map(|_| drain(&queue))).await;

        let mut slots: Vec<Option<TaskOutcome<T>>> = (0..total).map(|_| None).collect();

        for (index, outcome) in finished.into_iter().flatten() {
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(TaskError::new("task was never claimed"))))
            .collect()
    }
}

/// Claim and run tasks until the queue is empty
async fn drain<I, T, E, F, Fut>(queue: &Mutex<I>) -> Vec<(usize, TaskOutcome<T>)>
where
    I: Iterator<Item = (usize, F)>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut done = Vec::new();

    loop {
        let claimed = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
        let Some((index, task)) = claimed else {
            break;
        };

        let outcome = match AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TaskError::new(e.to_string())),
            Err(panic) => Err(TaskError::new(format!(
                "task panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        done.push((index, outcome));
    }

    done
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "unknown panic".to_string()
}
