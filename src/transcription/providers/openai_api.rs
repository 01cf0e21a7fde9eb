use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use tracing::{debug, error, info};

use super::TranscriptionProvider;
use crate::transcription::{Segment, Transcript};

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// OpenAI-compatible `/audio/transcriptions` endpoint, `verbose_json` output.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String, endpoint: Option<String>, model: String) -> Result<Self> {
        let client = reqwest::Client::new();
        let endpoint = endpoint
            .unwrap_or_else(|| "https://api.openai.com/v1/audio/transcriptions".to_string());

        info!(
            "Initialized OpenAI provider with endpoint: {}, model: {}",
            endpoint, model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
        })
    }
}

impl TranscriptionProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "OpenAI API"
    }

    fn transcribe<'a>(
        &'a self,
        audio_path: &'a Path,
        language: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Transcript>> + Send + 'a>> {
        Box::pin(async move {
            let audio_data = tokio::fs::read(audio_path)
                .await
                .context("Failed to read audio file")?;

            let file_name = audio_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("audio")
                .to_string();

            let mut form = Form::new()
                .part("file", Part::bytes(audio_data).file_name(file_name))
                .text("model", self.model.clone())
                .text("response_format", "verbose_json");

            if !language.is_empty() && language != "auto" {
                form = form.text("language", language.to_string());
            }

            debug!("Sending transcription request to: {}", self.endpoint);

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .context("Failed to send request to OpenAI API")?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .context("Failed to read response body")?;

            if !status.is_success() {
                error!(
                    "OpenAI API request failed with status {}: {}",
                    status, response_text
                );

                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
                    return Err(anyhow::anyhow!(
                        "OpenAI API error: {}",
                        error_response.error.message
                    ));
                }

                return Err(anyhow::anyhow!(
                    "OpenAI API request failed with status {}: {}",
                    status,
                    response_text
                ));
            }

            let parsed: VerboseTranscription = serde_json::from_str(&response_text)
                .context("Failed to parse transcription response")?;

            Ok(into_transcript(parsed))
        })
    }
}

fn into_transcript(parsed: VerboseTranscription) -> Transcript {
    let mut segments: Vec<Segment> = parsed
        .segments
        .into_iter()
        .map(|segment| Segment {
            start: segment.start,
            end: segment.end,
            text: segment.text.trim().to_string(),
        })
        .collect();

    // Some compatible servers only return the flat text.
    if segments.is_empty() && !parsed.text.trim().is_empty() {
        segments.push(Segment {
            start: 0.0,
            end: parsed.duration.unwrap_or(0.0),
            text: parsed.text.trim().to_string(),
        });
    }

    Transcript {
        segments,
        duration: parsed.duration,
    }
}
