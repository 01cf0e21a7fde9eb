//! Audio upload endpoint.

use crate::api::error::{ApiError, ApiResult};
use crate::job::{JobService, UploadReceipt};
use crate::upload;
use axum::{
    extract::{Multipart, State},
    response::Json,
    routing::post,
    Router,
};
use tracing::debug;

pub fn router(service: JobService) -> Router {
    Router::new()
        .route("/upload", post(upload_audio))
        .with_state(service)
}

/// POST /upload - Multipart form with a `file` field.
///
/// The file name is checked before the body is read, so a rejected upload
/// never creates a job.
async fn upload_audio(
    State(service): State<JobService>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReceipt>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        upload::audio_extension(&filename)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        debug!("Received {} ({} bytes)", filename, bytes.len());

        let receipt = service.submit(&filename, &bytes).await?;
        return Ok(Json(receipt));
    }

    Err(ApiError::bad_request("Missing file field"))
}
