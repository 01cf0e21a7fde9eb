//! Validation and storage of uploaded audio files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::job::JobError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "mp4", "m4a", "flac"];

/// Lowercased extension of an acceptable audio file name.
pub fn audio_extension(filename: &str) -> Result<String, JobError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

    extension.ok_or_else(|| JobError::InvalidAudioFile(filename.to_string()))
}

/// Write the upload as `<dir>/<job_id>.<extension>`.
pub async fn save_upload(dir: &Path, job_id: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create upload directory {:?}", dir))?;

    let path = dir.join(format!("{}.{}", job_id, extension));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload to {:?}", path))?;

    debug!("Stored {} bytes at {:?}", bytes.len(), path);
    Ok(path)
}
