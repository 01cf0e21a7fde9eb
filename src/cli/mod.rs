pub mod args;
pub mod export;
pub mod jobs;

pub use args::{Cli, CliCommand, ExportCliArgs, JobsCliArgs};
pub use export::handle_export_command;
pub use jobs::handle_jobs_command;

use crate::config::Config;
use anyhow::Result;

/// Config from `--config`, or the default location.
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
