use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UploadRequest {
    /// Local path of the media file to upload.
    #[serde(default)]
    #[validate(length(min = 1, message = "filepath is required"))]
    pub filepath: String,

    #[serde(rename = "contentType", default)]
    #[validate(length(min = 1, message = "contentType is required"))]
    pub content_type: String,

    /// Extension of the requested output, e.g. `mp4`.
    #[serde(rename = "target-format", default)]
    #[validate(
        length(min = 1, message = "target-format is required"),
        custom(function = "validate_target_format")
    )]
    pub target_format: String,
}

fn validate_target_format(format: &str) -> Result<(), ValidationError> {
    if format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(());
    }
    Err(ValidationError::new("target_format")
        .with_message(Cow::Borrowed("target-format must be a bare extension such as mp4")))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub status: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(rename = "outputKey")]
    pub output_key: String,
    #[serde(rename = "completedAt")]
    pub completed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: serde_json::Value) -> UploadRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn complete_request_is_valid() {
        let req = request(serde_json::json!({
            "filepath": "/videos/clip.mov",
            "contentType": "video/quicktime",
            "target-format": "mp4"
        }));
        assert!(req.validate().is_ok());
        assert_eq!(req.target_format, "mp4");
    }

    #[test]
    fn missing_fields_fail_validation() {
        let req = request(serde_json::json!({ "filepath": "/videos/clip.mov" }));
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("content_type"));
        assert!(fields.contains_key("target_format"));
        assert!(!fields.contains_key("filepath"));
    }

    #[test]
    fn target_format_must_be_bare_extension() {
        let req = request(serde_json::json!({
            "filepath": "/videos/clip.mov",
            "contentType": "video/quicktime",
            "target-format": "../mp4"
        }));
        assert!(req.validate().is_err());
    }
}
