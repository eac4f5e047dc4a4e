//! Media files on disk.
//!
//! Files are named `{YYYYmmdd_HHMMSS}_{8 hex}_{index}.{ext}` for images and
//! `{YYYYmmdd_HHMMSS}_{8 hex}.{ext}` for videos.

use std::io;
use std::path::{Path, PathBuf};

use lumen_core::media::MediaKind;
use lumen_core::types::Timestamp;

/// Directory holding generated media.
#[derive(Debug, Clone)]
pub struct MediaDir {
    root: PathBuf,
}

impl MediaDir {
    /// Open (creating if needed) the media directory.
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a fresh, collision-resistant filename.
    pub fn new_filename(kind: MediaKind, index: usize, extension: &str, now: Timestamp) -> String {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let unique = uuid::Uuid::new_v4().simple().to_string();
        let short = &unique[..8];
        match kind {
            MediaKind::Image => format!("{stamp}_{short}_{index}.{extension}"),
            MediaKind::Video => format!("{stamp}_{short}.{extension}"),
        }
    }

    pub async fn write(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.path(filename)?, bytes).await
    }

    pub async fn read(&self, filename: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path(filename)?).await
    }

    /// Delete a file. A file that is already gone is not an error.
    pub async fn remove(&self, filename: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.path(filename)?).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(filename, "Media file already missing");
                Ok(())
            }
            other => other,
        }
    }

    /// Resolve a stored filename, refusing anything that escapes the root.
    fn path(&self, filename: &str) -> io::Result<PathBuf> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename == "."
            || filename == ".."
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid media filename: {filename:?}"),
            ));
        }
        Ok(self.root.join(filename))
    }
}

/// Extension of a stored filename, without the dot.
pub fn extension_of(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default()
}
