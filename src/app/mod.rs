use crate::api::ApiServer;
use crate::config::Config;
use crate::export::ExportRenderer;
use crate::job::{JobQueue, JobService, JobStore, StageProcessor};
use crate::summarization::Summarizer;
use crate::transcription::Transcriber;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const INTERRUPTED_ERROR: &str = "processing interrupted by service restart";

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting minutes service");

    let store = JobStore::open(&config.storage.db_file()?)?;
    let uploads_dir = config.storage.uploads_dir()?;
    let exports_dir = config.storage.exports_dir()?;

    let interrupted = store
        .fail_interrupted(INTERRUPTED_ERROR)
        .await
        .context("Failed to sweep interrupted jobs")?;
    if interrupted > 0 {
        warn!("Marked {} interrupted job(s) as failed", interrupted);
    }

    let transcriber = Arc::new(Transcriber::from_config(&config.transcription)?);
    let summarizer = Arc::new(Summarizer::from_config(&config.summarization)?);
    let processor = StageProcessor::new(store.clone(), transcriber, summarizer);

    let queue = JobQueue::start(
        processor,
        config.worker.concurrency,
        config.worker.queue_capacity,
    );

    let service = JobService::new(
        store,
        queue.handle(),
        Arc::new(ExportRenderer::new(exports_dir)),
        uploads_dir,
    );

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let api_server = ApiServer::new(&config.server, service);
    info!("Minutes service is ready");
    let served = api_server.start(shutdown.clone()).await;

    shutdown.cancel();
    queue.shutdown().await;

    served
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down");
        shutdown.cancel();
    });
}
