#[cfg(test)]
use crate::core::config::StorageConfig;
#[cfg(test)]
use crate::features::uploads::dtos::IncomingFile;
#[cfg(test)]
use crate::features::uploads::UploadService;
#[cfg(test)]
use crate::modules::imaging::{ConversionError, DerivativeGenerator, ImageConverter};
#[cfg(test)]
use crate::modules::storage::LocalStorage;

#[cfg(test)]
use axum::body::Bytes;
#[cfg(test)]
use std::{path::Path, sync::Arc};

/// Build an upload service rooted at `<root>/uploads`.
///
/// Passing a converter enables derivatives the same way a detected tool does.
#[cfg(test)]
pub async fn create_test_service(
    root: &Path,
    converter: Option<FakeConverter>,
) -> (Arc<UploadService>, Arc<LocalStorage>) {
    let config = StorageConfig {
        upload_dir: root.join("uploads"),
        derived_dir_name: "derived".to_string(),
    };
    let storage = Arc::new(LocalStorage::new(&config).await.unwrap());

    let derivatives = converter.map(|converter| {
        DerivativeGenerator::new(
            Arc::new(converter),
            storage.derived_dir().to_path_buf(),
            800,
            "webp".to_string(),
        )
    });

    (
        Arc::new(UploadService::new(Arc::clone(&storage), derivatives)),
        storage,
    )
}

#[cfg(test)]
pub fn incoming(name: &str, content_type: &str, data: &[u8]) -> IncomingFile {
    IncomingFile {
        original_filename: name.to_string(),
        content_type: content_type.to_string(),
        data: Bytes::copy_from_slice(data),
    }
}

/// In-process stand-in for the external image tool
#[cfg(test)]
pub struct FakeConverter {
    fail_thumbnail: bool,
    fail_convert: bool,
    write_output: bool,
}

#[cfg(test)]
#[allow(dead_code)]
impl FakeConverter {
    /// Both operations succeed and write an output file
    pub fn working() -> Self {
        Self {
            fail_thumbnail: false,
            fail_convert: false,
            write_output: true,
        }
    }

    /// Thumbnail exits non-zero, conversion succeeds
    pub fn failing_thumbnail() -> Self {
        Self {
            fail_thumbnail: true,
            ..Self::working()
        }
    }

    /// Both operations exit non-zero
    pub fn broken() -> Self {
        Self {
            fail_thumbnail: true,
            fail_convert: true,
            write_output: true,
        }
    }

    /// Both operations report success but write nothing
    pub fn silent() -> Self {
        Self {
            write_output: false,
            ..Self::working()
        }
    }

    async fn produce(
        &self,
        fail: bool,
        src: &Path,
        dst: &Path,
        tag: &str,
    ) -> Result<(), ConversionError> {
        if fail {
            return Err(ConversionError::Failed {
                command: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: format!("{}: improper image header", src.display()),
            });
        }

        if self.write_output {
            let mut content = tag.as_bytes().to_vec();
            content.extend(tokio::fs::read(src).await.unwrap_or_default());
            tokio::fs::write(dst, content)
                .await
                .map_err(|source| ConversionError::Launch {
                    command: "fake".to_string(),
                    source,
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl ImageConverter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn thumbnail(
        &self,
        src: &Path,
        dst: &Path,
        _max_dimension: u32,
    ) -> Result<(), ConversionError> {
        self.produce(self.fail_thumbnail, src, dst, "thumb:").await
    }

    async fn convert(&self, src: &Path, dst: &Path) -> Result<(), ConversionError> {
        self.produce(self.fail_convert, src, dst, "converted:").await
    }
}
