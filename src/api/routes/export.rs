//! Document download endpoint.

use crate::api::error::ApiResult;
use crate::job::JobService;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ExportParams {
    /// txt, md, docx or pdf (default txt)
    pub format: Option<String>,
}

pub fn router(service: JobService) -> Router {
    Router::new()
        .route("/export/:job_id", get(export_job))
        .with_state(service)
}

/// GET /export/:job_id?format= - Download the minutes as a document.
async fn export_job(
    State(service): State<JobService>,
    Path(job_id): Path<String>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let format = params.format.as_deref().unwrap_or("txt");
    let artifact = service.export(&job_id, format).await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.download_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
