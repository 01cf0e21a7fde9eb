//! API route modules.

pub mod export;
pub mod jobs;
pub mod upload;
