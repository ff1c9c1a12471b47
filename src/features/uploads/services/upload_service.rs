use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::uploads::dtos::{
    is_image_mime_type, IncomingFile, StoredFileDto, UploadResponseDto,
};
use crate::modules::imaging::DerivativeGenerator;
use crate::modules::storage::LocalStorage;
use crate::shared::constants::{PHONE_MAX_DIGITS, PHONE_MIN_DIGITS};
use crate::shared::hashing::sha256_file;
use crate::shared::validation::normalize_phone;

/// Service for phone-tagged uploads
pub struct UploadService {
    storage: Arc<LocalStorage>,
    derivatives: Option<DerivativeGenerator>,
}

impl UploadService {
    /// `derivatives` is `None` when no image tool was found on this host
    pub fn new(storage: Arc<LocalStorage>, derivatives: Option<DerivativeGenerator>) -> Self {
        Self {
            storage,
            derivatives,
        }
    }

    pub fn derivatives_available(&self) -> bool {
        self.derivatives.is_some()
    }

    /// Validate the request, then persist every file in submission order
    ///
    /// # Arguments
    /// * `phone` - Raw phone value as submitted, if any
    /// * `files` - File parts in the order they were received
    ///
    /// # Returns
    /// The normalized phone, tool availability and per-file metadata.
    /// Nothing is written when validation fails.
    pub async fn upload(
        &self,
        phone: Option<String>,
        files: Vec<IncomingFile>,
    ) -> Result<UploadResponseDto> {
        let raw_phone =
            phone.ok_or_else(|| AppError::BadRequest("Phone number is required".to_string()))?;

        let phone = normalize_phone(&raw_phone).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid phone number: expected between {} and {} digits",
                PHONE_MIN_DIGITS, PHONE_MAX_DIGITS
            ))
        })?;

        if files.is_empty() {
            return Err(AppError::BadRequest("No files were uploaded".to_string()));
        }

        // One at a time, so same-name files get their suffixes in submission order
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            stored.push(self.store_file(file).await?);
        }

        info!(
            "Upload completed: phone={}, files={}, derivatives={}",
            phone,
            stored.len(),
            self.derivatives_available()
        );

        Ok(UploadResponseDto {
            phone,
            files: stored,
            imagemagick: self.derivatives_available(),
        })
    }

    /// Write one file, hash what landed on disk and attach derivatives
    async fn store_file(&self, file: IncomingFile) -> Result<StoredFileDto> {
        let object = self
            .storage
            .store(&file.original_filename, &file.data)
            .await?;

        let size_bytes = fs::metadata(&object.path)
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to stat {}: {}", object.path.display(), e))
            })?
            .len();
        let sha256 = sha256_file(&object.path).await.map_err(|e| {
            AppError::Internal(format!("Failed to hash {}: {}", object.path.display(), e))
        })?;

        info!(
            "File stored: original={}, stored={}, size={}, sha256={}",
            file.original_filename, object.stored_filename, size_bytes, sha256
        );

        let mut dto = StoredFileDto {
            original_filename: file.original_filename,
            stored_filename: object.stored_filename,
            mime_type: file.content_type,
            size_bytes,
            sha256,
            derived: Vec::new(),
            derived_error: None,
        };

        let Some(generator) = self.derivatives.as_ref() else {
            return Ok(dto);
        };
        if !is_image_mime_type(&dto.mime_type) {
            debug!("Skipping derivatives for non-image {}", dto.stored_filename);
            return Ok(dto);
        }

        match generator.generate(&object.path).await {
            Ok(records) => {
                dto.derived = records.into_iter().map(Into::into).collect();
            }
            Err(e) => {
                warn!(
                    "Derivative pipeline failed for {} ({}): {}",
                    dto.stored_filename,
                    generator.tool_name(),
                    e
                );
                dto.derived_error = Some(e.to_string());
            }
        }

        Ok(dto)
    }
}
