use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::Transcript;

pub mod openai_api;
pub mod whisper_cpp;

pub use openai_api::OpenAIProvider;
pub use whisper_cpp::WhisperCppProvider;

pub trait TranscriptionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn transcribe<'a>(
        &'a self,
        audio_path: &'a Path,
        language: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Transcript>> + Send + 'a>>;
}
