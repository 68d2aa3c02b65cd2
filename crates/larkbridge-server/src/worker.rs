//! Fixed-size pool of tokio workers for webhook jobs
//!
//! The webhook acknowledges an event immediately and hands the slow part
//! (model call, tool calls, platform replies) to the pool. Workers share
//! one queue; `shutdown` closes it and waits until every queued job ran.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle as TaskHandle;

use crate::error::PoolClosed;

/// A unit of work
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct Queued {
    job: Job,
    done: oneshot::Sender<bool>,
}

/// Completion signal for a submitted job
pub struct JobHandle {
    done: oneshot::Receiver<bool>,
}

impl JobHandle {
    /// Wait for the job; false if it panicked or never ran
    pub async fn wait(self) -> bool {
        self.done.await.unwrap_or(false)
    }
}

pub struct WorkerPool {
    sender: Mutex<Option<mpsc::UnboundedSender<Queued>>>,
    workers: Mutex<Vec<TaskHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) on the current runtime
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Queued>();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..size.max(1))
            .map(|id| tokio::spawn(run_worker(id, receiver.clone())))
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    pub fn size(&self) -> usize {
        self.workers.lock().len()
    }

    /// Queue a job
    pub fn submit<F>(&self, job: F) -> Result<JobHandle, PoolClosed>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (done, receiver) = oneshot::channel();
        let queued = Queued {
            job: Box::pin(job),
            done,
        };

        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(PoolClosed)?;
        sender.send(queued).map_err(|_| PoolClosed)?;
        Ok(JobHandle { done: receiver })
    }

    /// Stop accepting jobs and wait for the queue to drain
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        for result in join_all(workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "worker task failed");
            }
        }
    }
}

async fn run_worker(id: usize, queue: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Queued>>>) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(Queued { job, done }) = next else {
            break;
        };

        let completed = AssertUnwindSafe(job).catch_unwind().await.is_ok();
        if !completed {
            tracing::error!(worker = id, "job panicked");
        }
        let _ = done.send(completed);
    }
    tracing::debug!(worker = id, "worker stopped");
}
