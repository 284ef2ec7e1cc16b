use crate::common::response::ErrorBody;
use crate::modules::transcode::dto::{UploadRequest, UploadResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::transcode::handler::upload,
    ),
    components(
        schemas(UploadRequest, UploadResponse, ErrorBody)
    ),
    tags(
        (name = "Transcode", description = "Upload media and wait for its transcoded output")
    )
)]
pub struct ApiDoc;
