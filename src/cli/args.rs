use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "minutes")]
#[command(about = "Meeting audio to minutes: transcription, summary and export", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// Print version information
    Version,
    /// List jobs or show one job in detail
    Jobs(JobsCliArgs),
    /// Export the minutes of a completed job
    Export(ExportCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct JobsCliArgs {
    /// Maximum number of jobs to list
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Show a single job by ID
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ExportCliArgs {
    /// Job ID
    pub id: String,
    /// Document format: txt, md, docx or pdf
    #[arg(short, long, default_value = "txt")]
    pub format: String,
    /// Also copy the document to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
