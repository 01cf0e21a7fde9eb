use anyhow::Result;
use clap::Parser;
use minutes::{
    app,
    cli::{handle_export_command, handle_jobs_command, load_config, Cli, CliCommand},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Some(CliCommand::Version) = cli.command {
        println!("minutes {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Some(CliCommand::Jobs(args)) => handle_jobs_command(args, &config).await,
        Some(CliCommand::Export(args)) => handle_export_command(args, &config).await,
        Some(CliCommand::Serve) | Some(CliCommand::Version) | None => {
            app::run_service(config).await
        }
    }
}
