//! The persisted job record and the views exposed to clients.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::summarization::MeetingMinutes;

use super::error::JobError;
use super::status::JobStatus;

pub const PROGRESS_TRANSCRIBING: u8 = 25;
pub const PROGRESS_TRANSCRIBED: u8 = 50;
pub const PROGRESS_ANALYZING: u8 = 75;
pub const PROGRESS_COMPLETE: u8 = 100;

/// One submitted audio file and everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub filename: String,
    pub file_path: String,
    pub status: JobStatus,
    pub current_stage: String,
    pub progress: u8,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub action_items: Vec<String>,
    pub decisions: Vec<String>,
    pub participants: BTreeSet<String>,
    /// Seconds of audio, when the transcription engine or file header reports it.
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            file_path: file_path.into(),
            status: JobStatus::Uploaded,
            current_stage: JobStatus::Uploaded.stage_label().to_string(),
            progress: 0,
            transcript: None,
            summary: None,
            action_items: Vec::new(),
            decisions: Vec::new(),
            participants: BTreeSet::new(),
            duration: None,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Move to the next stage. Failure goes through [`Job::fail`] instead.
    pub fn advance(&mut self, next: JobStatus, progress: u8) -> Result<(), JobError> {
        self.ensure_open()?;
        if next == JobStatus::Failed || !self.status.can_advance_to(next) {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.set_progress(progress)?;
        self.status = next;
        self.current_stage = next.stage_label().to_string();
        Ok(())
    }

    pub fn set_progress(&mut self, progress: u8) -> Result<(), JobError> {
        self.ensure_open()?;
        if progress < self.progress || progress > PROGRESS_COMPLETE {
            return Err(JobError::ProgressRegression {
                current: self.progress,
                requested: progress,
            });
        }
        self.progress = progress;
        Ok(())
    }

    /// Attach the transcript. Only valid once, while transcribing.
    pub fn record_transcript(
        &mut self,
        transcript: String,
        duration: Option<f64>,
    ) -> Result<(), JobError> {
        self.ensure_open()?;
        if self.status != JobStatus::Transcribing || self.transcript.is_some() {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to: JobStatus::Analyzing,
            });
        }
        self.set_progress(PROGRESS_TRANSCRIBED)?;
        self.transcript = Some(transcript);
        self.duration = duration;
        Ok(())
    }

    pub fn complete(&mut self, minutes: MeetingMinutes) -> Result<(), JobError> {
        self.advance(JobStatus::Completed, PROGRESS_COMPLETE)?;
        self.summary = Some(minutes.summary);
        self.action_items = minutes.action_items;
        self.decisions = minutes.decisions;
        self.participants = minutes.participants;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.ensure_open()?;
        self.status = JobStatus::Failed;
        self.current_stage = JobStatus::Failed.stage_label().to_string();
        self.error = Some(error.into());
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::TerminalState {
                id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            job_id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            current_stage: self.current_stage.clone(),
            created_at: format_timestamp(&self.created_at),
            completed_at: self.completed_at.as_ref().map(format_timestamp),
            error: self.error.clone(),
        }
    }

    /// The summary payload. Unavailable until the job has completed.
    pub fn summary_view(&self) -> Result<JobSummaryView, JobError> {
        if self.status != JobStatus::Completed {
            return Err(JobError::NotReady(self.status));
        }
        Ok(JobSummaryView {
            job_id: self.id.clone(),
            filename: self.filename.clone(),
            summary: self.summary.clone().unwrap_or_default(),
            action_items: self.action_items.clone(),
            decisions: self.decisions.clone(),
            participants: self.participants.iter().cloned().collect(),
            duration: self.duration,
        })
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Response body of `GET /status/{job_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_stage: String,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub error: Option<String>,
}

/// Response body of `GET /summary/{job_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummaryView {
    pub job_id: String,
    pub filename: String,
    pub summary: String,
    pub action_items: Vec<String>,
    pub decisions: Vec<String>,
    pub participants: Vec<String>,
    pub duration: Option<f64>,
}
