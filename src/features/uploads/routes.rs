use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;

use crate::features::uploads::handlers::upload_files;
use crate::features::uploads::services::UploadService;

/// Create routes for the uploads feature
pub fn routes(upload_service: Arc<UploadService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(upload_service)
}
