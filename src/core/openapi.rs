use utoipa::{Modify, OpenApi};

use crate::features::uploads::{dtos as uploads_dtos, handlers as uploads_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Uploads
        uploads_handlers::upload_files,
    ),
    components(
        schemas(
            // Uploads
            uploads_dtos::UploadFilesDto,
            uploads_dtos::UploadResponseDto,
            uploads_dtos::StoredFileDto,
            uploads_dtos::DerivativeDto,
            ApiResponse<uploads_dtos::UploadResponseDto>,
        )
    ),
    tags(
        (name = "uploads", description = "Phone-tagged file uploads with image derivatives"),
    ),
    info(
        title = "Phone Uploads API",
        version = "0.1.0",
        description = "API documentation for Phone Uploads",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
