//! SHA-256 digests of files on disk.

use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::shared::constants::HASH_CHUNK_SIZE;

/// Hash everything readable from `reader`, returning the lowercase hex digest.
///
/// Reads in `HASH_CHUNK_SIZE` chunks so memory use does not depend on input size.
pub async fn sha256_reader<R>(mut reader: R) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash the file at `path`.
pub async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path).await?;
    sha256_reader(file).await
}
