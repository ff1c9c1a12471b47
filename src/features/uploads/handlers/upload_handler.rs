use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::uploads::dtos::{IncomingFile, UploadFilesDto, UploadResponseDto};
use crate::features::uploads::services::UploadService;
use crate::shared::constants::{FALLBACK_CONTENT_TYPE, FALLBACK_FILENAME};
use crate::shared::types::ApiResponse;

/// Map multipart read failures, keeping the body-limit case distinguishable
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    debug!("{}: {}", context, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, e.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, e.body_text()))
    }
}

/// Upload files for a phone number
///
/// Accepts multipart/form-data with:
/// - `phone`: phone number, 8-15 digits once non-digits are removed (required)
/// - `files`: one or more files (required; `file` is accepted too)
///
/// Images also get a thumbnail and a web-format copy when an image tool is available.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "uploads",
    request_body(
        content = UploadFilesDto,
        content_type = "multipart/form-data",
        description = "Phone number plus one or more files",
    ),
    responses(
        (status = 201, description = "Files stored", body = ApiResponse<UploadResponseDto>),
        (status = 400, description = "Invalid phone number or no files"),
        (status = 413, description = "Request body too large"),
        (status = 500, description = "Files could not be written")
    )
)]
pub async fn upload_files(
    State(service): State<Arc<UploadService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponseDto>>), AppError> {
    let mut phone: Option<String> = None;
    let mut files: Vec<IncomingFile> = Vec::new();

    // Read the whole form before validating so rejected requests never touch disk
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart data", e))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "phone" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Failed to read phone field", e))?;
                phone = Some(text);
            }
            "files" | "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

                let original_filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e))?;

                files.push(IncomingFile {
                    original_filename,
                    content_type,
                    data,
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let response = service.upload(phone, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None)),
    ))
}

#[cfg(test)]
mod tests {
    use crate::features::uploads::routes;
    use crate::shared::test_helpers::{create_test_service, FakeConverter};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::Value;
    use std::path::Path;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    async fn server(root: &Path, converter: Option<FakeConverter>) -> TestServer {
        let (service, _) = create_test_service(root, converter).await;
        TestServer::new(routes(service, 1024 * 1024)).unwrap()
    }

    fn file_part(name: &str, mime: &str, data: &[u8]) -> Part {
        Part::bytes(data.to_vec()).file_name(name).mime_type(mime)
    }

    #[tokio::test]
    async fn test_upload_text_file() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form = MultipartForm::new()
            .add_text("phone", "+1 (555) 123-4567")
            .add_part("files", file_part("note.txt", "text/plain", b"hello"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["phone"], "15551234567");
        assert_eq!(body["data"]["imagemagick"], false);

        let file = &body["data"]["files"][0];
        assert_eq!(file["original_filename"], "note.txt");
        assert_eq!(file["stored_filename"], "note.txt");
        assert_eq!(file["mime_type"], "text/plain");
        assert_eq!(file["size_bytes"], 5);
        assert_eq!(file["sha256"], HELLO_SHA256);
        assert_eq!(file["derived"], Value::Array(Vec::new()));
        assert!(file.get("derived_error").is_none());
    }

    #[tokio::test]
    async fn test_upload_duplicate_names_in_one_request() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form = MultipartForm::new()
            .add_part("files", file_part("photo.jpg", "image/jpeg", b"one"))
            .add_part("files", file_part("photo.jpg", "image/jpeg", b"two"))
            .add_text("phone", "5551234567");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let files = body["data"]["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["stored_filename"], "photo.jpg");
        assert_eq!(files[1]["stored_filename"], "photo_1.jpg");
    }

    #[tokio::test]
    async fn test_upload_rejects_short_phone_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form = MultipartForm::new()
            .add_part("files", file_part("note.txt", "text/plain", b"hello"))
            .add_text("phone", "123-4567");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_array());
        assert!(!tmp.path().join("uploads/note.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_missing_phone() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form =
            MultipartForm::new().add_part("files", file_part("note.txt", "text/plain", b"hello"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(!tmp.path().join("uploads/note.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_request_without_files() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form = MultipartForm::new()
            .add_text("phone", "12345678")
            .add_text("comment", "forgot the files");
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "No files were uploaded");
    }

    #[tokio::test]
    async fn test_upload_image_without_tool_has_no_derivatives() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), None).await;

        let form = MultipartForm::new()
            .add_text("phone", "12345678")
            .add_part("files", file_part("scan.png", "image/png", b"png bytes"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["imagemagick"], false);

        let file = &body["data"]["files"][0];
        assert_eq!(file["derived"], Value::Array(Vec::new()));
        assert!(file.get("derived_error").is_none());
        let derived_dir = tmp.path().join("uploads/derived");
        assert_eq!(std::fs::read_dir(derived_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_image_with_partial_derivative_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(tmp.path(), Some(FakeConverter::failing_thumbnail())).await;

        let form = MultipartForm::new()
            .add_text("phone", "12345678")
            .add_part("files", file_part("scan.png", "image/png", b"not a png"));
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["imagemagick"], true);

        let derived = body["data"]["files"][0]["derived"].as_array().unwrap();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0]["type"], "thumbnail");
        assert!(derived[0]["error"].is_string());
        assert!(derived[0].get("filename").is_none());
        assert_eq!(derived[1]["type"], "webp");
        assert_eq!(derived[1]["filename"], "scan.webp");
        assert!(derived[1]["sha256"].is_string());
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_body() {
        let tmp = tempfile::tempdir().unwrap();
        let (service, _) = create_test_service(tmp.path(), None).await;
        let server = TestServer::new(routes(service, 1024)).unwrap();

        let form = MultipartForm::new()
            .add_text("phone", "12345678")
            .add_part(
                "files",
                file_part("big.bin", "application/octet-stream", &[0u8; 8192]),
            );
        let response = server.post("/upload").multipart(form).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!tmp.path().join("uploads/big.bin").exists());
    }
}
