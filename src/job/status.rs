//! Job status values and the allowed transitions between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a job's processing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Transcribing,
    Analyzing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Transcribing => "transcribing",
            Self::Analyzing => "analyzing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(Self::Uploaded),
            "transcribing" => Some(Self::Transcribing),
            "analyzing" => Some(Self::Analyzing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Label shown to clients as `current_stage`.
    pub fn stage_label(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Transcribing => "Transcribing",
            Self::Analyzing => "Analyzing",
            Self::Completed => "Complete",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Strictly linear: each stage has exactly one successor, and any
    /// non-terminal stage may fail.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::Uploaded, Self::Transcribing)
            | (Self::Transcribing, Self::Analyzing)
            | (Self::Analyzing, Self::Completed) => true,
            (current, Self::Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 5] = [
        JobStatus::Uploaded,
        JobStatus::Transcribing,
        JobStatus::Analyzing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    #[test]
    fn test_status_as_str_parses_back() {
        for status in ALL {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("summarizing"), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Transcribing).unwrap();
        assert_eq!(json, "\"transcribing\"");

        let parsed: JobStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, JobStatus::Completed);
    }

    #[test]
    fn test_linear_path_is_the_only_forward_path() {
        assert!(JobStatus::Uploaded.can_advance_to(JobStatus::Transcribing));
        assert!(JobStatus::Transcribing.can_advance_to(JobStatus::Analyzing));
        assert!(JobStatus::Analyzing.can_advance_to(JobStatus::Completed));

        assert!(!JobStatus::Uploaded.can_advance_to(JobStatus::Completed));
        assert!(!JobStatus::Uploaded.can_advance_to(JobStatus::Analyzing));
        assert!(!JobStatus::Analyzing.can_advance_to(JobStatus::Transcribing));
        assert!(!JobStatus::Transcribing.can_advance_to(JobStatus::Uploaded));
    }

    #[test]
    fn test_any_open_stage_can_fail() {
        assert!(JobStatus::Uploaded.can_advance_to(JobStatus::Failed));
        assert!(JobStatus::Transcribing.can_advance_to(JobStatus::Failed));
        assert!(JobStatus::Analyzing.can_advance_to(JobStatus::Failed));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in ALL {
            assert!(!JobStatus::Completed.can_advance_to(next));
            assert!(!JobStatus::Failed.can_advance_to(next));
        }
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(JobStatus::Transcribing.stage_label(), "Transcribing");
        assert_eq!(JobStatus::Completed.stage_label(), "Complete");
    }
}
