pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod export;
pub mod global;
pub mod job;
pub mod summarization;
pub mod transcription;
pub mod upload;
