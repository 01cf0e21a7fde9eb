use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::SummarizationConfig;

mod extract;
pub mod providers;

pub use extract::MinutesExtractor;
pub use providers::{ExtractiveProvider, OpenAISummaryProvider, SummaryProvider};

/// Structured result of summarizing one meeting transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingMinutes {
    pub summary: String,
    pub action_items: Vec<String>,
    pub decisions: Vec<String>,
    pub participants: BTreeSet<String>,
}

/// Transcript text in, meeting minutes out.
#[async_trait]
pub trait SummarizationEngine: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<MeetingMinutes>;
}

/// Builds the narrative summary with the configured provider and pulls the
/// structured fields out with [`MinutesExtractor`].
///
/// The provider is constructed on the first call, so a misconfigured
/// provider only surfaces as a failed job.
pub struct Summarizer {
    provider_name: String,
    config: SummarizationConfig,
    provider: OnceCell<Box<dyn SummaryProvider>>,
    extractor: MinutesExtractor,
}

impl Summarizer {
    pub fn from_config(config: &SummarizationConfig) -> Result<Self> {
        let provider_name = config
            .provider
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "extractive".to_string());

        if let Some(error) = validate_provider_config(&provider_name, config) {
            bail!("Invalid summarization config: {}", error);
        }

        Ok(Self {
            provider_name,
            config: config.clone(),
            provider: OnceCell::new(),
            extractor: MinutesExtractor::new()?,
        })
    }

    async fn provider(&self) -> Result<&dyn SummaryProvider> {
        let provider = self
            .provider
            .get_or_try_init(|| async { build_provider(&self.provider_name, &self.config) })
            .await?;
        Ok(provider.as_ref())
    }
}

#[async_trait]
impl SummarizationEngine for Summarizer {
    async fn summarize(&self, transcript: &str) -> Result<MeetingMinutes> {
        if transcript.trim().is_empty() {
            bail!("Transcript is empty, nothing to summarize");
        }

        let provider = self.provider().await?;
        let cleaned = self.extractor.clean(transcript);
        debug!(
            "Summarizing {} chars of transcript with {}",
            cleaned.len(),
            provider.name()
        );

        let summary = provider
            .summarize(&cleaned)
            .await
            .with_context(|| format!("{} failed to summarize transcript", provider.name()))?;

        let minutes = MeetingMinutes {
            summary: summary.trim().to_string(),
            action_items: self.extractor.action_items(transcript),
            decisions: self.extractor.decisions(transcript),
            participants: self.extractor.participants(transcript),
        };

        info!(
            "Summary ready: {} action items, {} decisions, {} participants",
            minutes.action_items.len(),
            minutes.decisions.len(),
            minutes.participants.len()
        );
        Ok(minutes)
    }
}

fn build_provider(name: &str, config: &SummarizationConfig) -> Result<Box<dyn SummaryProvider>> {
    let provider: Box<dyn SummaryProvider> = match name {
        "extractive" => Box::new(ExtractiveProvider::new(config.max_sentences)),
        "openai-api" => {
            let api_key = config
                .api_key
                .clone()
                .context("api_key is required for OpenAI summarization")?;
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            Box::new(OpenAISummaryProvider::new(
                api_key,
                config.api_endpoint.clone(),
                model,
            )?)
        }
        _ => bail!(
            "Unknown summarization provider '{}'. Supported providers: extractive, openai-api",
            name
        ),
    };

    info!("Using {} for summarization", provider.name());
    Ok(provider)
}

/// Returns an error message if the provider cannot work with this config.
pub fn validate_provider_config(provider: &str, config: &SummarizationConfig) -> Option<String> {
    match provider {
        "extractive" => {
            if config.max_sentences == 0 {
                Some("max_sentences must be at least 1".to_string())
            } else {
                None
            }
        }
        "openai-api" => {
            if config.api_key.is_none() {
                Some("API key required for OpenAI summarization".to_string())
            } else {
                None
            }
        }
        _ => Some(format!("Unknown provider: {}", provider)),
    }
}
