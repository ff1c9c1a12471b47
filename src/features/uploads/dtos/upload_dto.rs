use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::imaging::DerivativeRecord;

/// Upload request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFilesDto {
    /// Phone number; any non-digit characters are ignored (8-15 digits required)
    #[schema(example = "+1 (555) 123-4567")]
    pub phone: String,
    /// One or more binary file parts, all sent under the `files` field name
    pub files: Vec<String>,
}

/// A file part as received from the client
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Filename exactly as the client sent it
    pub original_filename: String,
    /// Declared MIME type
    pub content_type: String,
    pub data: Bytes,
}

/// Response DTO for an upload request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    /// Phone number reduced to its digits
    pub phone: String,
    /// One entry per uploaded file, in submission order
    pub files: Vec<StoredFileDto>,
    /// Whether an image tool was found, i.e. whether derivatives are produced at all
    pub imagemagick: bool,
}

/// Metadata of one stored file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoredFileDto {
    pub original_filename: String,
    /// Name on disk; carries a `_N` suffix when the original name was taken
    pub stored_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the stored bytes
    pub sha256: String,
    /// Generated derivatives (images only)
    pub derived: Vec<DerivativeDto>,
    /// Set when derivative generation could not run at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_error: Option<String>,
}

/// A generated derivative, or the reason it could not be generated
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DerivativeDto {
    /// `thumbnail` or the target format extension (e.g. `webp`)
    #[serde(rename = "type")]
    #[schema(example = "thumbnail")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DerivativeRecord> for DerivativeDto {
    fn from(record: DerivativeRecord) -> Self {
        let kind = record.kind.label().to_string();
        match record.outcome {
            Ok(file) => Self {
                kind,
                filename: Some(file.filename),
                size_bytes: Some(file.size_bytes),
                sha256: Some(file.sha256),
                error: None,
            },
            Err(error) => Self {
                kind,
                filename: None,
                size_bytes: None,
                sha256: None,
                error: Some(error),
            },
        }
    }
}

/// Check if a MIME type denotes an image
pub fn is_image_mime_type(content_type: &str) -> bool {
    content_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
