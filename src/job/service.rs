use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::export::{ExportArtifact, ExportFormat, ExportRenderer};
use crate::upload;

use super::error::JobError;
use super::model::{Job, JobStatusView, JobSummaryView};
use super::queue::JobQueueHandle;
use super::status::JobStatus;
use super::store::JobStore;

/// Reply to an accepted upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub job_id: String,
    pub filename: String,
    pub status: JobStatus,
}

/// Operations exposed to clients: submit audio, poll, fetch results.
#[derive(Clone)]
pub struct JobService {
    store: JobStore,
    queue: JobQueueHandle,
    renderer: Arc<ExportRenderer>,
    uploads_dir: PathBuf,
}

impl JobService {
    pub fn new(
        store: JobStore,
        queue: JobQueueHandle,
        renderer: Arc<ExportRenderer>,
        uploads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            queue,
            renderer,
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Validate, store and queue an uploaded file. Returns once the job is
    /// queued, without waiting for processing.
    ///
    /// Waits for queue capacity before anything is written, so a request
    /// dropped while the queue is full leaves no job behind.
    pub async fn submit(&self, filename: &str, bytes: &[u8]) -> Result<UploadReceipt, JobError> {
        let extension = upload::audio_extension(filename)?;
        let slot = self.queue.reserve().await?;
        let job_id = Uuid::new_v4().to_string();

        let path = upload::save_upload(&self.uploads_dir, &job_id, &extension, bytes).await?;
        let job = Job::new(&job_id, filename, path.to_string_lossy());

        // Detached so a cancelled request cannot create the job without queueing it.
        let store = self.store.clone();
        let record = job.clone();
        let registered = tokio::spawn(async move {
            store.create(&record).await?;
            slot.send(&record.id);
            Ok::<(), JobError>(())
        })
        .await
        .context("Job registration task failed")?;

        if let Err(e) = registered {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove orphaned upload {:?}: {}", path, remove_err);
            }
            return Err(e);
        }

        info!("Accepted upload {} as job {}", filename, job_id);

        Ok(UploadReceipt {
            job_id,
            filename: filename.to_string(),
            status: job.status,
        })
    }

    pub async fn status(&self, job_id: &str) -> Result<JobStatusView, JobError> {
        Ok(self.store.require(job_id).await?.status_view())
    }

    pub async fn summary(&self, job_id: &str) -> Result<JobSummaryView, JobError> {
        self.store.require(job_id).await?.summary_view()
    }

    /// Checks run in order: unknown job, unsupported format, not completed.
    pub async fn export(&self, job_id: &str, format: &str) -> Result<ExportArtifact, JobError> {
        let job = self.store.require(job_id).await?;
        let format = ExportFormat::parse(format)?;
        self.renderer.write(&job, format).await
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<Job>, JobError> {
        self.store.list(limit).await
    }
}
