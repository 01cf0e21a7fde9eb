//! Bounded hand-off from the upload path to a fixed pool of workers.
//!
//! Uploads reserve a slot in an `mpsc` channel before creating their job; a
//! full channel makes the reservation wait. Workers share the receiver and run one job at a time each.
//! Cancelling the queue stops workers from taking new jobs; a job already
//! being processed runs to completion.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::processor::StageProcessor;

/// Cloneable sender side of the queue.
#[derive(Clone)]
pub struct JobQueueHandle {
    tx: mpsc::Sender<String>,
}

impl JobQueueHandle {
    /// Wait for room in the queue. The slot is held until sent or dropped.
    pub async fn reserve(&self) -> Result<QueueSlot> {
        let permit = self
            .tx
            .clone()
            .reserve_owned()
            .await
            .map_err(|_| anyhow!("Job queue is closed"))?;
        Ok(QueueSlot { permit })
    }
}

/// A reserved place in the queue; sending never waits.
pub struct QueueSlot {
    permit: mpsc::OwnedPermit<String>,
}

impl QueueSlot {
    pub fn send(self, job_id: &str) {
        self.permit.send(job_id.to_string());
        debug!("Queued job {}", job_id);
    }
}

pub struct JobQueue {
    handle: JobQueueHandle,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    pub fn start(processor: StageProcessor, concurrency: usize, capacity: usize) -> Self {
        let concurrency = concurrency.max(1);
        let (tx, rx) = mpsc::channel::<String>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let cancel = CancellationToken::new();

        let workers = (0..concurrency)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    processor.clone(),
                    rx.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        info!(
            "Job queue started with {} workers (capacity {})",
            concurrency, capacity
        );

        Self {
            handle: JobQueueHandle { tx },
            cancel,
            workers,
        }
    }

    pub fn handle(&self) -> JobQueueHandle {
        self.handle.clone()
    }

    /// Stop taking jobs and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        info!("Shutting down job queue");
        self.cancel.cancel();
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("Job worker panicked: {}", e);
            }
        }
        info!("Job queue stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    processor: StageProcessor,
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
    cancel: CancellationToken,
) {
    debug!("Job worker {} started", worker_id);

    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                job_id = rx.recv() => job_id,
            }
        };

        let Some(job_id) = next else {
            break;
        };

        debug!("Worker {} picked up job {}", worker_id, job_id);
        processor.process(&job_id).await;
    }

    debug!("Job worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::processor::tests::{FakeSummarizer, FakeTranscriber};
    use crate::job::{Job, JobStatus, JobStore};
    use std::time::Duration;

    async fn wait_for_terminal(store: &JobStore, id: &str) -> Job {
        for _ in 0..200 {
            let job = store.require(id).await.unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never finished", id);
    }

    #[tokio::test]
    async fn test_queue_processes_jobs() {
        let store = JobStore::in_memory().unwrap();
        let processor = StageProcessor::new(
            store.clone(),
            Arc::new(FakeTranscriber { fail: false }),
            Arc::new(FakeSummarizer::default()),
        );
        let queue = JobQueue::start(processor, 2, 4);
        let handle = queue.handle();

        for id in ["a", "b", "c"] {
            store
                .create(&Job::new(id, "m.wav", format!("/tmp/{}.wav", id)))
                .await
                .unwrap();
            handle.reserve().await.unwrap().send(id);
        }

        for id in ["a", "b", "c"] {
            let job = wait_for_terminal(&store, id).await;
            assert_eq!(job.status, JobStatus::Completed);
        }

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_reserve_waits_for_capacity() {
        let store = JobStore::in_memory().unwrap();
        let processor = StageProcessor::new(
            store,
            Arc::new(FakeTranscriber { fail: false }),
            Arc::new(FakeSummarizer::default()),
        );
        let queue = JobQueue::start(processor, 1, 1);
        let handle = queue.handle();

        let held = handle.reserve().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(50), handle.reserve()).await;
        assert!(blocked.is_err());

        drop(held);
        let freed = tokio::time::timeout(Duration::from_millis(50), handle.reserve()).await;
        assert!(matches!(freed, Ok(Ok(_))));

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_reserve_after_shutdown_fails() {
        let store = JobStore::in_memory().unwrap();
        let processor = StageProcessor::new(
            store,
            Arc::new(FakeTranscriber { fail: false }),
            Arc::new(FakeSummarizer::default()),
        );
        let queue = JobQueue::start(processor, 1, 1);
        let handle = queue.handle();
        queue.shutdown().await;

        assert!(handle.reserve().await.is_err());
    }
}
