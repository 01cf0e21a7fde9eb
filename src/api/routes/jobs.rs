//! Job progress and result endpoints.

use crate::api::error::ApiResult;
use crate::job::{JobService, JobStatusView, JobSummaryView};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

pub fn router(service: JobService) -> Router {
    Router::new()
        .route("/status/:job_id", get(job_status))
        .route("/summary/:job_id", get(job_summary))
        .with_state(service)
}

/// GET /status/:job_id - Current stage and progress.
async fn job_status(
    State(service): State<JobService>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusView>> {
    Ok(Json(service.status(&job_id).await?))
}

/// GET /summary/:job_id - Meeting minutes, once processing has completed.
async fn job_summary(
    State(service): State<JobService>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSummaryView>> {
    Ok(Json(service.summary(&job_id).await?))
}
