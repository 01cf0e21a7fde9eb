use anyhow::{bail, Context, Result};
use regex::Regex;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::TranscriptionProvider;
use crate::transcription::{Segment, Transcript};

/// Local whisper.cpp CLI. Segments are parsed from its timestamped stdout.
pub struct WhisperCppProvider {
    command_path: String,
    model: String,
    model_path: String,
    segment_regex: Regex,
}

impl WhisperCppProvider {
    pub fn new(command_path: Option<String>, model: String, model_path: Option<String>) -> Result<Self> {
        let command_path = command_path.unwrap_or_else(|| "whisper-cli".to_string());
        let model_path = model_path
            .context("model_path is required for whisper.cpp provider")?;

        if !Path::new(&model_path).exists() {
            bail!("whisper.cpp model not found at {}", model_path);
        }

        // Matches [00:00:00.000 --> 00:00:03.280] and the colon variant.
        let segment_regex = Regex::new(
            r"^\[(\d{2}):(\d{2}):(\d{2})[.:](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[.:](\d{3})\]\s*(.*)$",
        )?;

        info!(
            "Initialized whisper.cpp provider: {} (model {} at {})",
            command_path, model, model_path
        );

        Ok(Self {
            command_path,
            model,
            model_path,
            segment_regex,
        })
    }

    fn parse_output(&self, stdout: &str) -> Vec<Segment> {
        stdout
            .lines()
            .filter_map(|line| {
                let caps = self.segment_regex.captures(line.trim())?;
                let text = caps[9].trim();
                if text.is_empty() {
                    return None;
                }
                Some(Segment {
                    start: seconds(&caps[1], &caps[2], &caps[3], &caps[4]),
                    end: seconds(&caps[5], &caps[6], &caps[7], &caps[8]),
                    text: text.to_string(),
                })
            })
            .collect()
    }
}

fn seconds(hours: &str, minutes: &str, secs: &str, millis: &str) -> f64 {
    let part = |s: &str| s.parse::<f64>().unwrap_or(0.0);
    part(hours) * 3600.0 + part(minutes) * 60.0 + part(secs) + part(millis) / 1000.0
}

impl TranscriptionProvider for WhisperCppProvider {
    fn name(&self) -> &'static str {
        "whisper.cpp"
    }

    fn transcribe<'a>(
        &'a self,
        audio_path: &'a Path,
        language: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Transcript>> + Send + 'a>> {
        Box::pin(async move {
            let mut command = Command::new(&self.command_path);
            command
                .arg("-m")
                .arg(&self.model_path)
                .arg("-f")
                .arg(audio_path);

            if !language.is_empty() {
                command.arg("-l").arg(language);
            }

            debug!(
                "Running {} ({}) on {:?}",
                self.command_path, self.model, audio_path
            );

            let output = command
                .output()
                .await
                .with_context(|| format!("Failed to run {}", self.command_path))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!("whisper.cpp failed: {}", stderr.trim());
                bail!(
                    "whisper.cpp exited with {}: {}",
                    output.status,
                    stderr.trim()
                );
            }

            let stdout = String::from_utf8_lossy(&output.stdout);
            let segments = self.parse_output(&stdout);
            debug!("whisper.cpp produced {} segments", segments.len());

            Ok(Transcript::new(segments))
        })
    }
}
