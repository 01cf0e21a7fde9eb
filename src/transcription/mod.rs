use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::TranscriptionConfig;

pub mod providers;

pub use providers::{OpenAIProvider, TranscriptionProvider, WhisperCppProvider};

/// One timed span of recognized speech. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    /// Length of the audio when the provider reports it.
    pub duration: Option<f64>,
}

impl Transcript {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            duration: None,
        }
    }

    /// `[mm:ss] text` per segment, segments separated by a blank line.
    pub fn to_text(&self) -> String {
        self.segments
            .iter()
            .filter(|segment| !segment.text.trim().is_empty())
            .map(|segment| {
                let start = segment.start.max(0.0) as u64;
                format!(
                    "[{:02}:{:02}] {}",
                    start / 60,
                    start % 60,
                    segment.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Reported duration, else the end of the last segment.
    pub fn duration(&self) -> Option<f64> {
        self.duration.or_else(|| {
            self.segments
                .iter()
                .map(|segment| segment.end)
                .fold(None, |max: Option<f64>, end| {
                    Some(max.map_or(end, |max| max.max(end)))
                })
                .filter(|end| *end > 0.0)
        })
    }
}

/// Audio file in, timestamped transcript out.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}

/// Transcription engine backed by a configured provider.
///
/// The provider is built on first use and then shared by every job.
pub struct Transcriber {
    provider_name: String,
    config: ProviderConfig,
    provider: OnceCell<Box<dyn TranscriptionProvider>>,
}

impl Transcriber {
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        let provider_name = config
            .provider
            .clone()
            .filter(|p| !p.is_empty())
            .context("No transcription provider configured")?;

        if let Some(error) = validate_provider_config(&provider_name, config) {
            bail!("Invalid transcription config: {}", error);
        }

        Ok(Self::with_provider(&provider_name, ProviderConfig::from(config)))
    }

    pub fn with_provider(provider_name: &str, config: ProviderConfig) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            config,
            provider: OnceCell::new(),
        }
    }

    async fn provider(&self) -> Result<&dyn TranscriptionProvider> {
        let provider = self
            .provider
            .get_or_try_init(|| async { build_provider(&self.provider_name, self.config.clone()) })
            .await?;
        Ok(provider.as_ref())
    }

    fn language(&self) -> &str {
        self.config.language.as_deref().unwrap_or("en")
    }
}

#[async_trait]
impl TranscriptionEngine for Transcriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let provider = self.provider().await?;
        info!(
            "Transcribing audio file: {:?} with {}",
            audio_path,
            provider.name()
        );

        let mut transcript = provider.transcribe(audio_path, self.language()).await?;
        if transcript.segments.is_empty() {
            bail!("{} returned no speech segments", provider.name());
        }

        if transcript.duration().is_none() {
            transcript.duration = probe_wav_duration(audio_path).await;
        }

        debug!(
            "Transcribed {} segments, duration {:?}",
            transcript.segments.len(),
            transcript.duration()
        );
        Ok(transcript)
    }
}

/// Duration from a WAV header. Other containers are not inspected.
pub async fn probe_wav_duration(audio_path: &Path) -> Option<f64> {
    let is_wav = audio_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return None;
    }

    let path: PathBuf = audio_path.to_path_buf();
    let probed = tokio::task::spawn_blocking(move || -> Result<f64> {
        let reader = hound::WavReader::open(&path).context("Failed to open WAV file")?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            bail!("WAV header reports a zero sample rate");
        }
        Ok(reader.duration() as f64 / spec.sample_rate as f64)
    })
    .await;

    match probed {
        Ok(Ok(seconds)) => Some(seconds),
        Ok(Err(e)) => {
            warn!("Could not read WAV duration of {:?}: {:#}", audio_path, e);
            None
        }
        Err(e) => {
            warn!("WAV duration probe task failed: {}", e);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: Option<String>,
    pub model_path: Option<String>,
    pub language: Option<String>,
    pub command_path: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl From<&TranscriptionConfig> for ProviderConfig {
    fn from(config: &TranscriptionConfig) -> Self {
        Self {
            model: config.model.clone(),
            model_path: config.model_path.clone(),
            language: config.language.clone(),
            command_path: config.command_path.clone(),
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

fn build_provider(provider_name: &str, config: ProviderConfig) -> Result<Box<dyn TranscriptionProvider>> {
    let provider: Box<dyn TranscriptionProvider> = match provider_name {
        "openai-api" => {
            let api_key = config
                .api_key
                .context("api_key is required for OpenAI API provider")?;

            let model = config.model.unwrap_or_else(|| "whisper-1".to_string());
            Box::new(OpenAIProvider::new(api_key, config.api_endpoint, model)?)
        }
        "whisper-cpp" => {
            let model = config.model.unwrap_or_else(|| "base".to_string());
            Box::new(WhisperCppProvider::new(
                config.command_path,
                model,
                config.model_path,
            )?)
        }
        _ => bail!(
            "Unknown transcription provider '{}'. Supported providers: openai-api, whisper-cpp",
            provider_name
        ),
    };

    info!("Using {} for transcription", provider.name());
    Ok(provider)
}

/// Validate provider configuration and return an error message if invalid.
pub fn validate_provider_config(provider: &str, config: &TranscriptionConfig) -> Option<String> {
    match provider {
        "openai-api" => {
            if config.api_key.is_none() {
                Some("API key required for OpenAI API".to_string())
            } else {
                None
            }
        }
        "whisper-cpp" => {
            if config.command_path.is_none() {
                Some("Command path required for whisper.cpp".to_string())
            } else if config.model_path.as_deref().map_or(true, str::is_empty) {
                Some("Model path required for whisper.cpp (set transcription.model_path)".to_string())
            } else {
                None
            }
        }
        _ => Some(format!("Unknown provider: {}", provider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_transcript_text_format() {
        let transcript = Transcript::new(vec![
            segment(0.0, 4.2, " Alice: Welcome everyone. "),
            segment(65.7, 70.0, "Bob: Thanks."),
            segment(70.0, 71.0, "   "),
        ]);

        assert_eq!(
            transcript.to_text(),
            "[00:00] Alice: Welcome everyone.\n\n[01:05] Bob: Thanks."
        );
    }

    #[test]
    fn test_duration_from_last_segment() {
        let transcript = Transcript::new(vec![segment(0.0, 4.0, "a"), segment(4.0, 9.5, "b")]);
        assert_eq!(transcript.duration(), Some(9.5));

        let reported = Transcript {
            duration: Some(12.0),
            ..transcript
        };
        assert_eq!(reported.duration(), Some(12.0));

        assert_eq!(Transcript::default().duration(), None);
    }

    #[tokio::test]
    async fn test_probe_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..16000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        assert_eq!(probe_wav_duration(&path).await, Some(2.0));
        assert_eq!(probe_wav_duration(Path::new("/tmp/meeting.mp3")).await, None);
    }

    #[test]
    fn test_validate_provider_config() {
        let mut config = TranscriptionConfig::default();
        let error = validate_provider_config("whisper-cpp", &config).unwrap();
        assert!(error.contains("model_path"));

        config.model_path = Some("/models/ggml-base.bin".to_string());
        assert_eq!(validate_provider_config("whisper-cpp", &config), None);

        config.command_path = None;
        assert!(validate_provider_config("whisper-cpp", &config).is_some());
        assert!(validate_provider_config("openai-api", &config).is_some());
        assert!(validate_provider_config("assembly", &config).is_some());
    }

    #[test]
    fn test_default_config_is_rejected_at_startup() {
        let err = Transcriber::from_config(&TranscriptionConfig::default())
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("model_path"));
    }

    #[tokio::test]
    async fn test_provider_errors_surface_on_first_use() {
        // The model file itself is only checked when the provider is built.
        let config = TranscriptionConfig {
            model_path: Some("/nonexistent/ggml-base.bin".to_string()),
            ..TranscriptionConfig::default()
        };
        let transcriber = Transcriber::from_config(&config).unwrap();
        let err = transcriber
            .transcribe(Path::new("/tmp/missing.wav"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("model not found"));
    }
}
