use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::shared::constants::{FALLBACK_FILENAME, MAX_COLLISION_ATTEMPTS};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to prepare directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free name for '{0}' after {1} attempts")]
    NameExhausted(String, u32),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A file persisted under the upload root
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub path: PathBuf,
    pub stored_filename: String,
}

/// Local filesystem storage with an upload root and a derivatives subdirectory
pub struct LocalStorage {
    upload_dir: PathBuf,
    derived_dir: PathBuf,
}

impl LocalStorage {
    /// Create both directories if they are missing
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        let upload_dir = config.upload_dir.clone();
        let derived_dir = upload_dir.join(&config.derived_dir_name);

        for dir in [&upload_dir, &derived_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| StorageError::Directory {
                    path: dir.clone(),
                    source,
                })?;
        }

        info!(
            "Local storage ready: uploads={}, derived={}",
            upload_dir.display(),
            derived_dir.display()
        );

        Ok(Self {
            upload_dir,
            derived_dir,
        })
    }

    #[cfg(test)]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn derived_dir(&self) -> &Path {
        &self.derived_dir
    }

    /// Persist `data` under a collision-free name derived from `original_filename`.
    ///
    /// Candidates are `name`, `base_1.ext`, `base_2.ext`, ... and each one is
    /// claimed with an exclusive create, so two writers can never end up on
    /// the same path.
    pub async fn store(&self, original_filename: &str, data: &[u8]) -> StorageResult<StoredObject> {
        let filename = sanitize_filename(original_filename);
        let (base, ext) = split_extension(&filename);

        for attempt in 0..MAX_COLLISION_ATTEMPTS {
            let candidate = if attempt == 0 {
                filename.clone()
            } else {
                format!("{}_{}{}", base, attempt, ext)
            };
            let path = self.upload_dir.join(&candidate);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Name taken, trying next suffix: {}", candidate);
                    continue;
                }
                Err(source) => return Err(StorageError::Write { path, source }),
            };

            let path = write_or_discard(path, async {
                file.write_all(data).await?;
                file.flush().await?;
                file.sync_all().await
            })
            .await?;

            return Ok(StoredObject {
                path,
                stored_filename: candidate,
            });
        }

        Err(StorageError::NameExhausted(filename, MAX_COLLISION_ATTEMPTS))
    }
}

/// Run the write for a freshly claimed `path`, removing the file if it fails
/// so a partial write never holds on to the name.
async fn write_or_discard<F>(path: PathBuf, write: F) -> StorageResult<PathBuf>
where
    F: Future<Output = std::io::Result<()>>,
{
    match write.await {
        Ok(()) => Ok(path),
        Err(source) => {
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to remove partial upload {}: {}", path.display(), e);
            }
            Err(StorageError::Write { path, source })
        }
    }
}

/// Reduce a client-supplied filename to its final path component.
///
/// Both `/` and `\` count as separators. Names that end up empty, `.` or `..`
/// fall back to `FALLBACK_FILENAME`.
pub fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("");

    match name {
        "" | "." | ".." => FALLBACK_FILENAME.to_string(),
        _ => name.to_string(),
    }
}

/// Split `name` into base and extension, the extension keeping its dot.
///
/// Leading dots belong to the base, so `.env` has no extension and
/// `archive.tar.gz` splits into `archive.tar` + `.gz`.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name.split_at(leading + idx),
        None => (name, ""),
    }
}
