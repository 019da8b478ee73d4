//! Local store for downloaded media.
//!
//! One file per message id. An empty file is a deliberate placeholder for
//! a failed download that should not be retried.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Downloads directory {} could not be created due to {source}.", path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    #[error("File {} creation failed due to {source}.", path.display())]
    FileCreation { path: PathBuf, source: io::Error },

    #[error("Data could not be written to file {} due to {source}.", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Path {} is not a direct child of {}.", path.display(), dir.display())]
    Outside { path: PathBuf, dir: PathBuf },

    #[error("Path {} is reserved for the staged outgoing file.", path.display())]
    Reserved { path: PathBuf },
}

/// Write `data` to `path`, creating `downloads_dir` first.
///
/// Existing files are truncated. A failed write may leave a partial file
/// behind; the error is the only signal.
pub async fn store_downloaded_data(
    downloads_dir: &Path,
    path: &Path,
    data: &[u8],
) -> Result<(), MediaError> {
    fs::create_dir_all(downloads_dir)
        .await
        .map_err(|source| MediaError::DirectoryCreation {
            path: downloads_dir.to_path_buf(),
            source,
        })?;

    let mut file = fs::File::create(path)
        .await
        .map_err(|source| MediaError::FileCreation {
            path: path.to_path_buf(),
            source,
        })?;

    let write_err = |source| MediaError::Write {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(data).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;

    debug!(path = %path.display(), bytes = data.len(), "Stored media");
    Ok(())
}
