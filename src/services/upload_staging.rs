use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// An uploaded image parked on disk for the duration of one ingestion.
///
/// The file is deleted when the guard is dropped, whichever way the
/// ingestion ends.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Write `bytes` to a fresh file under `dir` on the blocking pool.
    pub async fn stage(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let dir = dir.to_path_buf();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || Self::stage_blocking(&dir, &bytes))
            .await
            .map_err(io::Error::other)?
    }

    fn stage_blocking(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut file = Builder::new()
            .prefix("upload-")
            .suffix(".img")
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        debug!("Staged {} byte upload at {}", bytes.len(), file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}
