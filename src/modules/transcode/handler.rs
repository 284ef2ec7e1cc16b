use super::dto::{UploadRequest, UploadResponse};
use crate::common::response::{ApiError, ErrorBody};
use crate::state::AppState;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

/// Upload a media file and wait for its transcoded output
///
/// Blocks until the worker reports completion for the derived output key, then returns a
/// pre-signed download URL for it.
#[utoipa::path(
    post,
    path = "/upload",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Job completed", body = UploadResponse),
        (status = 400, description = "Invalid upload request", body = ErrorBody),
        (status = 408, description = "Job processing timeout", body = ErrorBody),
        (status = 500, description = "Signing or upload failure", body = ErrorBody),
        (status = 502, description = "Worker reported failure", body = ErrorBody),
        (status = 503, description = "Server shutting down", body = ErrorBody)
    ),
    tag = "Transcode"
)]
pub async fn upload(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let cancel = state.shutdown.child_token();
    let response = state.transcoder.process_upload(req, &cancel).await?;

    Ok(Json(response))
}
