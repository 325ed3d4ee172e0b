//! Fixed-size worker pool with results returned in submission order.

use crate::core::error::{Result, SubtypeError, TrainingError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;

/// A fixed-size pool of worker threads.
///
/// Each call to [`run`](WorkerPool::run) submits one job per task descriptor.
/// Every job reports through its own one-shot channel, so results come back
/// in submission order regardless of completion order. The threads are
/// released when the pool is dropped.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    num_workers: usize,
}

impl WorkerPool {
    /// Create a pool of `num_workers` threads.
    pub fn new(num_workers: usize) -> Result<Self> {
        if num_workers < 1 {
            return Err(SubtypeError::invalid_parameter(
                "num_workers",
                num_workers.to_string(),
                "must be at least 1",
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("subtype-worker-{}", index))
            .build()
            .map_err(|e| SubtypeError::threading(format!("Failed to create worker pool: {}", e)))?;

        Ok(WorkerPool { pool, num_workers })
    }

    /// Number of worker threads
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Apply `job` to every task and collect the outcomes in task order.
    ///
    /// All tasks run to completion before this returns. The first failing
    /// task, in task order, determines the error; a panicking job is reported
    /// as a threading error.
    pub fn run<T, R, F>(&self, tasks: Vec<T>, job: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> Result<R> + Sync,
    {
        let job = &job;
        let receivers: Vec<mpsc::Receiver<Result<R>>> = self.pool.scope(|scope| {
            tasks
                .into_iter()
                .enumerate()
                .map(|(index, task)| {
                    let (sender, receiver) = mpsc::sync_channel(1);
                    scope.spawn(move |_| {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(task)))
                            .unwrap_or_else(|payload| {
                                Err(TrainingError::WorkerPanicked {
                                    member: index,
                                    reason: panic_message(payload.as_ref()),
                                }
                                .into())
                            });
                        // The receiver outlives the scope, so this cannot fail.
                        let _ = sender.send(outcome);
                    });
                    receiver
                })
                .collect()
        });

        receivers
            .into_iter()
            .enumerate()
            .map(|(index, receiver)| {
                receiver
                    .recv()
                    .map_err(|_| {
                        SubtypeError::threading(format!("task {} finished without a result", index))
                    })
                    .and_then(|outcome| outcome)
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
