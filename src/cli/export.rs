use anyhow::{Context, Result};

use crate::config::Config;
use crate::export::{ExportFormat, ExportRenderer};
use crate::job::JobStore;

use super::args::ExportCliArgs;

pub async fn handle_export_command(args: ExportCliArgs, config: &Config) -> Result<()> {
    let store = JobStore::open(&config.storage.db_file()?)?;
    let renderer = ExportRenderer::new(config.storage.exports_dir()?);

    let job = store.require(&args.id).await?;
    let format = ExportFormat::parse(&args.format)?;
    let artifact = renderer.write(&job, format).await?;

    println!("Exported to {}", artifact.path.display());

    if let Some(output) = args.output {
        tokio::fs::write(&output, &artifact.bytes)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Copied to {}", output.display());
    }

    Ok(())
}
