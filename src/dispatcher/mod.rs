//! Dispatcher: bounded worker concurrency and FIFO queueing in front of
//! the engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use crate::engine::{Engine, FetchOptions, FetchResponse};
use crate::error::{FetchError, FetchResult};

/// A submitted job's outcome, either the engine's result or cancellation
/// while still queued.
pub enum JobOutcome {
    Completed(FetchResult<FetchResponse>),
    Cancelled,
}

pub struct Dispatcher {
    engine: Arc<Engine>,
    worker_slots: Arc<Semaphore>,
    queued: AtomicUsize,
    max_queue_depth: usize,
}

impl Dispatcher {
    #[must_use]
    pub fn new(engine: Arc<Engine>, worker_concurrency: usize, max_queue_depth: usize) -> Self {
        Self {
            engine,
            worker_slots: Arc::new(Semaphore::new(worker_concurrency)),
            queued: AtomicUsize::new(0),
            max_queue_depth,
        }
    }

    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.worker_slots.available_permits()
    }

    /// Submit a job. `cancel` fires if the caller gives up while the job is
    /// still queued; once the engine has been invoked the job runs to
    /// completion (the engine itself honors `opts.timeout`).
    ///
    /// # Errors
    /// Returns [`FetchError`] with [`crate::error::ErrorKind::QueueFull`] if
    /// the bounded submit queue is already at capacity.
    pub async fn submit(
        &self,
        url: String,
        opts: FetchOptions,
        cancel: Arc<Notify>,
    ) -> Result<JobOutcome, FetchError> {
        if self.queued.fetch_add(1, Ordering::AcqRel) >= self.max_queue_depth {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            return Err(FetchError::queue_full());
        }

        let enqueued_at = Instant::now();
        let job_id = Uuid::new_v4();

        let permit = tokio::select! {
            biased;
            () = cancel.notified() => {
                self.queued.fetch_sub(1, Ordering::AcqRel);
                return Ok(JobOutcome::Cancelled);
            }
            permit = self.worker_slots.clone().acquire_owned() => permit,
        };

        self.queued.fetch_sub(1, Ordering::AcqRel);
        let permit = permit.expect("worker semaphore is never closed");
        let queue_wait = enqueued_at.elapsed();

        let result = self.engine.fetch(job_id, &url, opts, queue_wait).await;
        drop(permit);
        Ok(JobOutcome::Completed(result))
    }
}
