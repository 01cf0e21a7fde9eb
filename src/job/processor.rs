use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::summarization::SummarizationEngine;
use crate::transcription::TranscriptionEngine;

use super::model::{Job, PROGRESS_ANALYZING, PROGRESS_TRANSCRIBING};
use super::status::JobStatus;
use super::store::JobStore;

/// Drives one job from `uploaded` to a terminal state.
#[derive(Clone)]
pub struct StageProcessor {
    store: JobStore,
    transcriber: Arc<dyn TranscriptionEngine>,
    summarizer: Arc<dyn SummarizationEngine>,
}

impl StageProcessor {
    pub fn new(
        store: JobStore,
        transcriber: Arc<dyn TranscriptionEngine>,
        summarizer: Arc<dyn SummarizationEngine>,
    ) -> Self {
        Self {
            store,
            transcriber,
            summarizer,
        }
    }

    /// Process a job by id. Never returns an error: any failure is recorded on
    /// the job itself.
    pub async fn process(&self, job_id: &str) {
        let mut job = match self.store.get(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("Job {} not found, skipping processing", job_id);
                return;
            }
            Err(e) => {
                error!("Failed to load job {}: {}", job_id, e);
                return;
            }
        };

        if job.status != JobStatus::Uploaded {
            warn!(
                "Job {} is already {}, skipping processing",
                job_id, job.status
            );
            return;
        }

        info!("Processing job {} ({})", job.id, job.filename);

        match self.run_stages(&mut job).await {
            Ok(()) => info!("Job {} completed", job.id),
            Err(e) => {
                let message = format!("{:#}", e);
                error!("Job {} failed: {}", job.id, message);
                if let Err(e) = job.fail(message) {
                    error!("Could not mark job {} failed: {}", job.id, e);
                    return;
                }
                if let Err(e) = self.store.save(&job).await {
                    error!("Could not persist failure of job {}: {}", job.id, e);
                }
            }
        }
    }

    async fn run_stages(&self, job: &mut Job) -> anyhow::Result<()> {
        job.advance(JobStatus::Transcribing, PROGRESS_TRANSCRIBING)?;
        self.store.save(job).await?;

        let transcript = self
            .transcriber
            .transcribe(Path::new(&job.file_path))
            .await
            .context("Transcription failed")?;

        let duration = transcript.duration();
        job.record_transcript(transcript.to_text(), duration)?;
        self.store.save(job).await?;
        info!(
            "Job {} transcribed ({} segments)",
            job.id,
            transcript.segments.len()
        );

        job.advance(JobStatus::Analyzing, PROGRESS_ANALYZING)?;
        self.store.save(job).await?;

        let text = job.transcript.clone().unwrap_or_default();
        let minutes = self
            .summarizer
            .summarize(&text)
            .await
            .context("Summarization failed")?;

        // Committed only once stored, so a failed write can still fail the job.
        let mut finished = job.clone();
        finished.complete(minutes)?;
        self.store.save(&finished).await?;
        *job = finished;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::summarization::MeetingMinutes;
    use crate::transcription::{Segment, Transcript};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct FakeTranscriber {
        pub fail: bool,
    }

    #[async_trait]
    impl TranscriptionEngine for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
            if self.fail {
                bail!("decoder could not read audio");
            }
            Ok(Transcript::new(vec![
                Segment {
                    start: 0.0,
                    end: 3.0,
                    text: "Alice: We agreed to ship on Friday.".to_string(),
                },
                Segment {
                    start: 3.0,
                    end: 7.5,
                    text: "Bob: Carol will write the notes.".to_string(),
                },
            ]))
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeSummarizer {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl SummarizationEngine for FakeSummarizer {
        async fn summarize(&self, transcript: &str) -> Result<MeetingMinutes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MeetingMinutes {
                summary: format!("{} chars discussed", transcript.len()),
                action_items: vec!["Carol will write the notes".to_string()],
                decisions: vec!["agreed to ship on Friday".to_string()],
                participants: ["Alice", "Bob"].iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    async fn setup(fail: bool) -> (StageProcessor, JobStore, Arc<FakeSummarizer>) {
        let store = JobStore::in_memory().unwrap();
        let summarizer = Arc::new(FakeSummarizer::default());
        let processor = StageProcessor::new(
            store.clone(),
            Arc::new(FakeTranscriber { fail }),
            summarizer.clone(),
        );
        store
            .create(&Job::new("job-1", "standup.mp3", "/tmp/job-1.mp3"))
            .await
            .unwrap();
        (processor, store, summarizer)
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (processor, store, summarizer) = setup(false).await;
        processor.process("job-1").await;

        let job = store.require("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.current_stage, "Complete");
        assert!(job.completed_at.is_some());
        assert_eq!(job.duration, Some(7.5));
        assert_eq!(
            job.transcript.as_deref(),
            Some("[00:00] Alice: We agreed to ship on Friday.\n\n[00:03] Bob: Carol will write the notes.")
        );
        assert_eq!(job.action_items, vec!["Carol will write the notes"]);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transcription_failure_marks_failed() {
        let (processor, store, summarizer) = setup(true).await;
        processor.process("job-1").await;

        let job = store.require("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, PROGRESS_TRANSCRIBING);
        let error = job.error.unwrap();
        assert!(error.starts_with("Transcription failed"));
        assert!(error.contains("decoder could not read audio"));
        assert!(job.transcript.is_none());
        assert!(job.summary.is_none());
        assert!(job.completed_at.is_none());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_completion_write_marks_failed() {
        let (processor, store, summarizer) = setup(false).await;
        store
            .execute_batch(
                "CREATE TRIGGER refuse_completion BEFORE UPDATE ON jobs \
                 WHEN NEW.status = 'completed' \
                 BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
            )
            .await
            .unwrap();

        processor.process("job-1").await;

        let job = store.require("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, PROGRESS_ANALYZING);
        assert!(job.error.unwrap().contains("disk I/O error"));
        assert!(job.summary.is_none());
        assert!(job.completed_at.is_none());
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_job_is_skipped() {
        let (processor, store, _) = setup(false).await;
        processor.process("unknown").await;

        assert!(store.get("unknown").await.unwrap().is_none());
        assert_eq!(store.list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_job_not_reprocessed() {
        let (processor, store, summarizer) = setup(false).await;
        processor.process("job-1").await;
        processor.process("job-1").await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
        let job = store.require("job-1").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(matches!(
            job.summary_view(),
            Ok(view) if view.participants == vec!["Alice", "Bob"]
        ));
    }
}
