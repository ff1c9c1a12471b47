use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::modules::imaging::converter::{ConversionError, ImageConverter};
use crate::modules::storage::split_extension;
use crate::shared::constants::THUMBNAIL_SUFFIX;
use crate::shared::hashing::sha256_file;

/// Which derivative a record describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivativeKind {
    Thumbnail,
    /// Re-encoded copy; carries the target extension (e.g. `webp`)
    Format(String),
}

impl DerivativeKind {
    /// Tag exposed to clients: `thumbnail` or the target extension
    pub fn label(&self) -> &str {
        match self {
            DerivativeKind::Thumbnail => "thumbnail",
            DerivativeKind::Format(extension) => extension,
        }
    }
}

/// Metadata of a derivative that was written successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: String,
}

/// Outcome of one derivative operation
#[derive(Debug, Clone)]
pub struct DerivativeRecord {
    pub kind: DerivativeKind,
    pub outcome: Result<GeneratedFile, String>,
}

/// Failures that prevent the pipeline from attempting any derivative
#[derive(Debug, Error)]
pub enum DerivativeError {
    #[error("source has no usable file name: {0}")]
    InvalidSource(PathBuf),

    #[error("failed to prepare derivatives directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces a thumbnail and a format-converted copy for an image
pub struct DerivativeGenerator {
    converter: Arc<dyn ImageConverter>,
    output_dir: PathBuf,
    max_dimension: u32,
    format_extension: String,
}

impl DerivativeGenerator {
    pub fn new(
        converter: Arc<dyn ImageConverter>,
        output_dir: PathBuf,
        max_dimension: u32,
        format_extension: String,
    ) -> Self {
        Self {
            converter,
            output_dir,
            max_dimension,
            format_extension,
        }
    }

    pub fn tool_name(&self) -> &str {
        self.converter.name()
    }

    /// Generate both derivatives of `src`.
    ///
    /// The two operations run concurrently and fail independently; each
    /// failure lands in its own record. The returned list is always
    /// `[thumbnail, format]`.
    pub async fn generate(&self, src: &Path) -> Result<Vec<DerivativeRecord>, DerivativeError> {
        let file_name = src
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DerivativeError::InvalidSource(src.to_path_buf()))?;
        let (base, ext) = split_extension(file_name);

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| DerivativeError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let thumb_path = self
            .output_dir
            .join(format!("{}{}{}", base, THUMBNAIL_SUFFIX, ext));
        let format_path = self
            .output_dir
            .join(format!("{}.{}", base, self.format_extension));

        let (thumb_result, format_result) = tokio::join!(
            self.converter
                .thumbnail(src, &thumb_path, self.max_dimension),
            self.converter.convert(src, &format_path),
        );

        let (thumbnail, converted) = tokio::join!(
            describe(DerivativeKind::Thumbnail, &thumb_path, thumb_result),
            describe(
                DerivativeKind::Format(self.format_extension.clone()),
                &format_path,
                format_result,
            ),
        );

        Ok(vec![thumbnail, converted])
    }
}

/// Turn a conversion result into a record, measuring and hashing the output
async fn describe(
    kind: DerivativeKind,
    path: &Path,
    result: Result<(), ConversionError>,
) -> DerivativeRecord {
    let outcome = match result {
        Ok(()) => inspect_output(path).await,
        Err(e) => Err(e.to_string()),
    };

    match &outcome {
        Ok(file) => info!(
            "Derivative {} written: {} ({} bytes)",
            kind.label(),
            file.filename,
            file.size_bytes
        ),
        Err(e) => warn!("Derivative {} failed for {}: {}", kind.label(), path.display(), e),
    }

    DerivativeRecord { kind, outcome }
}

async fn inspect_output(path: &Path) -> Result<GeneratedFile, String> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| format!("failed to read {}: {}", filename, e))?;
    let sha256 = sha256_file(path)
        .await
        .map_err(|e| format!("failed to hash {}: {}", filename, e))?;

    Ok(GeneratedFile {
        filename,
        size_bytes: metadata.len(),
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::FakeConverter;
    use sha2::{Digest, Sha256};

    fn generator(converter: FakeConverter, output_dir: PathBuf) -> DerivativeGenerator {
        DerivativeGenerator::new(Arc::new(converter), output_dir, 800, "webp".to_string())
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DerivativeKind::Thumbnail.label(), "thumbnail");
        assert_eq!(DerivativeKind::Format("webp".into()).label(), "webp");
    }

    #[tokio::test]
    async fn test_generate_writes_both_derivatives() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("photo.jpg");
        std::fs::write(&src, b"jpeg-bytes").unwrap();
        let out = tmp.path().join("derived");

        let records = generator(FakeConverter::working(), out.clone())
            .generate(&src)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, DerivativeKind::Thumbnail);
        assert_eq!(records[1].kind, DerivativeKind::Format("webp".into()));

        let thumb = records[0].outcome.as_ref().unwrap();
        assert_eq!(thumb.filename, "photo_thumb.jpg");
        let on_disk = std::fs::read(out.join("photo_thumb.jpg")).unwrap();
        assert_eq!(thumb.size_bytes, on_disk.len() as u64);
        assert_eq!(thumb.sha256, hex::encode(Sha256::digest(&on_disk)));

        let webp = records[1].outcome.as_ref().unwrap();
        assert_eq!(webp.filename, "photo.webp");
        assert!(out.join("photo.webp").is_file());
    }

    #[tokio::test]
    async fn test_thumbnail_failure_does_not_block_conversion() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("broken.png");
        std::fs::write(&src, b"not really a png").unwrap();
        let out = tmp.path().join("derived");

        let records = generator(FakeConverter::failing_thumbnail(), out.clone())
            .generate(&src)
            .await
            .unwrap();

        let thumb_error = records[0].outcome.as_ref().unwrap_err();
        assert!(thumb_error.contains("exited with"));
        assert!(!out.join("broken_thumb.png").exists());

        let webp = records[1].outcome.as_ref().unwrap();
        assert_eq!(webp.filename, "broken.webp");
    }

    #[tokio::test]
    async fn test_both_operations_can_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("corrupt.gif");
        std::fs::write(&src, b"???").unwrap();

        let records = generator(FakeConverter::broken(), tmp.path().join("derived"))
            .generate(&src)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.outcome.is_err()));
    }

    #[tokio::test]
    async fn test_success_without_output_file_is_recorded_as_error() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("ghost.png");
        std::fs::write(&src, b"png").unwrap();

        let records = generator(FakeConverter::silent(), tmp.path().join("derived"))
            .generate(&src)
            .await
            .unwrap();

        for record in &records {
            let error = record.outcome.as_ref().unwrap_err();
            assert!(error.starts_with("failed to read"), "{}", error);
        }
    }

    #[tokio::test]
    async fn test_unusable_output_dir_is_a_pipeline_error() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("photo.jpg");
        std::fs::write(&src, b"jpeg").unwrap();
        let blocker = tmp.path().join("derived");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();

        let err = generator(FakeConverter::working(), blocker)
            .generate(&src)
            .await
            .unwrap_err();

        assert!(matches!(err, DerivativeError::OutputDir { .. }));
    }
}
