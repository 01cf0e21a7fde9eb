use thiserror::Error;

use super::status::JobStatus;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Processing not completed (status: {0})")]
    NotReady(JobStatus),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid audio file format: {0}")]
    InvalidAudioFile(String),

    #[error("Job {0} already exists")]
    AlreadyExists(String),

    #[error("Job {id} is {status} and can no longer be modified")]
    TerminalState { id: String, status: JobStatus },

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Progress cannot decrease from {current} to {requested}")]
    ProgressRegression { current: u8, requested: u8 },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
