use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub mod extractive;
pub mod openai_api;

pub use extractive::ExtractiveProvider;
pub use openai_api::OpenAISummaryProvider;

/// Produces the narrative summary of a cleaned transcript.
pub trait SummaryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn summarize<'a>(
        &'a self,
        transcript: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}
