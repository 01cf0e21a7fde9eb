//! REST API server for the minutes service.
//!
//! Every route is served at the root and again under `/api`.

pub mod error;
pub mod routes;

use crate::config::ServerConfig;
use crate::job::JobService;
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct ApiServer {
    host: String,
    port: u16,
    app: Router,
}

impl ApiServer {
    pub fn new(config: &ServerConfig, service: JobService) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            app: router(service, config),
        }
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn start(self, shutdown: CancellationToken) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!("API server listening on http://{}", addr);
        info!("Endpoints (also under /api):");
        info!("  GET  /                  - Service info");
        info!("  GET  /version           - Version info");
        info!("  POST /upload            - Upload meeting audio");
        info!("  GET  /status/:job_id    - Job progress");
        info!("  GET  /summary/:job_id   - Meeting minutes");
        info!("  GET  /export/:job_id    - Download minutes (?format=txt|md|docx|pdf)");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("API server failed")?;

        info!("API server stopped");
        Ok(())
    }
}

/// The full application router.
pub fn router(service: JobService, config: &ServerConfig) -> Router {
    let routes = Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .merge(routes::upload::router(service.clone()))
        .merge(routes::jobs::router(service.clone()))
        .merge(routes::export::router(service));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "minutes",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "minutes"
    }))
}
