//! SQLite persistence for job records.

mod init;
pub mod jobs;

pub use init::{migrate, open};
pub use jobs::JobRepository;
