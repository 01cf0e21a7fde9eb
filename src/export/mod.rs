//! Rendering of completed jobs into downloadable documents.
//!
//! Every format carries the same content: title, source file, duration when
//! known, summary, action items, decisions and participants. Output depends
//! only on the job, so exporting twice yields identical bytes.

use anyhow::Context;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::job::{Job, JobError, JobStatus};

mod docx;
mod pdf;
mod text;

pub const DOCUMENT_TITLE: &str = "Meeting Minutes";
pub const EMPTY_SECTION: &str = "None recorded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Markdown,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self, JobError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "md" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(JobError::UnsupportedFormat(s.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered document, already written to the exports directory.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub download_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Format-independent view of a completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct MinutesDocument {
    pub title: String,
    pub source: String,
    pub duration: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: &'static str,
    pub body: SectionBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Paragraph(String),
    List(Vec<String>),
}

impl MinutesDocument {
    pub fn from_job(job: &Job) -> Result<Self, JobError> {
        let view = job.summary_view()?;

        Ok(Self {
            title: DOCUMENT_TITLE.to_string(),
            source: view.filename,
            duration: view.duration.map(format_duration),
            sections: vec![
                Section {
                    heading: "Summary",
                    body: SectionBody::Paragraph(view.summary),
                },
                Section {
                    heading: "Action Items",
                    body: SectionBody::List(view.action_items),
                },
                Section {
                    heading: "Decisions",
                    body: SectionBody::List(view.decisions),
                },
                Section {
                    heading: "Participants",
                    body: SectionBody::List(view.participants),
                },
            ],
        })
    }

    /// The header lines shared by every format: source and duration.
    pub fn details(&self) -> Vec<String> {
        let mut details = vec![format!("Source: {}", self.source)];
        if let Some(duration) = &self.duration {
            details.push(format!("Duration: {}", duration));
        }
        details
    }
}

/// `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

pub fn download_name(job_id: &str, format: ExportFormat) -> String {
    let short: String = job_id.chars().take(8).collect();
    format!("meeting-minutes-{}.{}", short, format.extension())
}

pub struct ExportRenderer {
    exports_dir: PathBuf,
}

impl ExportRenderer {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
        }
    }

    /// Document bytes for a completed job.
    pub fn render(&self, job: &Job, format: ExportFormat) -> Result<Vec<u8>, JobError> {
        if job.status != JobStatus::Completed {
            return Err(JobError::NotReady(job.status));
        }
        let document = MinutesDocument::from_job(job)?;

        let bytes = match format {
            ExportFormat::Txt => text::render_txt(&document).into_bytes(),
            ExportFormat::Markdown => text::render_markdown(&document).into_bytes(),
            ExportFormat::Docx => docx::render_docx(&document)?,
            ExportFormat::Pdf => pdf::render_pdf(&document)?,
        };
        Ok(bytes)
    }

    /// Render and store the document as `<exports_dir>/<job_id>.<ext>`.
    pub async fn write(&self, job: &Job, format: ExportFormat) -> Result<ExportArtifact, JobError> {
        let bytes = self.render(job, format)?;

        tokio::fs::create_dir_all(&self.exports_dir)
            .await
            .with_context(|| format!("Failed to create exports directory {:?}", self.exports_dir))?;

        let path = self
            .exports_dir
            .join(format!("{}.{}", job.id, format.extension()));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write export {:?}", path))?;

        info!("Exported job {} as {} ({} bytes)", job.id, format, bytes.len());

        Ok(ExportArtifact {
            path,
            download_name: download_name(&job.id, format),
            content_type: format.content_type(),
            bytes,
        })
    }
}
