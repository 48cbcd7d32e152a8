//! On-disk blob tier of the image cache.
//!
//! Blobs are lossless PNG copies of remote images, one file per locally
//! minted image id.  This tier is the authoritative decode source for both
//! thumbnails and the full-screen viewer.  It carries no eviction policy
//! and no locking: file names are unique per message, so concurrent writers
//! never touch the same path.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::Result;

/// Flat directory of cached image blobs.
#[derive(Debug, Clone)]
pub struct BlobCache {
    dir: PathBuf,
}

impl BlobCache {
    /// Open (and create if needed) the blob directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory the blobs live in; also used for outbound temp files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob for `image_id`, whether or not it exists yet.
    pub fn path(&self, image_id: i64) -> PathBuf {
        self.dir.join(format!("{image_id}.png"))
    }

    /// Write a blob atomically: to a temp file first, then rename, so a
    /// crash never leaves a partial blob behind.
    pub async fn write(&self, image_id: i64, data: &[u8]) -> Result<()> {
        let path = self.path(image_id);
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;

        debug!(image_id, size = data.len(), "stored image blob");
        Ok(())
    }

    /// Read a blob back; `Ok(None)` if it has not been cached yet.
    pub async fn read(&self, image_id: i64) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(image_id)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
