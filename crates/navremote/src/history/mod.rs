//! Read-only access to the history directory.
//!
//! The directory is owned and written by the navigation session; this module
//! only enumerates it and reads files out of it.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};

use crate::protocol::HistoryFileRef;

/// Error accessing the history directory
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("cannot enumerate history directory {path}: {source}")]
    Enumerate { path: PathBuf, source: io::Error },
    #[error("cannot read history file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("history file {0} does not exist")]
    Missing(PathBuf),
    #[error("{0} is not a file inside the history directory")]
    OutsideDirectory(PathBuf),
}

/// Accessor for one history directory
#[derive(Debug, Clone)]
pub struct HistoryStore {
    root: PathBuf,
}

impl HistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every non-hidden regular file, in directory enumeration order.
    ///
    /// Only entries that [`resolve`](Self::resolve) would accept are listed, so a
    /// symlink leading out of the directory is left out.
    pub async fn list(&self) -> Result<Vec<HistoryFileRef>, HistoryError> {
        let enumerate_err = |source| HistoryError::Enumerate { path: self.root.clone(), source };

        let root = fs::canonicalize(&self.root).await.map_err(enumerate_err)?;
        let mut entries = fs::read_dir(&self.root).await.map_err(enumerate_err)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(enumerate_err)? {
            let path = entry.path();
            if path.to_str().is_none() {
                warn!("Skipping history entry with a non UTF-8 path: {}", path.display());
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }

            // Entries can vanish mid-listing while a trip is being rotated.
            match confine(&root, &path).await {
                Ok((_, metadata)) => {
                    files.push(HistoryFileRef::new(name, &path, created_at(&metadata)));
                },
                Err(HistoryError::OutsideDirectory(_)) => {
                    debug!("Not listing {}: not a file inside the history directory", name);
                },
                Err(_) => continue,
            }
        }

        Ok(files)
    }

    /// Read a previously listed file fully into memory.
    pub async fn read(&self, file: &HistoryFileRef) -> Result<Vec<u8>, HistoryError> {
        let path = self.resolve(file).await?;
        fs::read(&path).await.map_err(|source| HistoryError::Read { path, source })
    }

    /// Whether a previously listed file is still present and readable as a file.
    pub async fn exists(&self, file: &HistoryFileRef) -> bool {
        self.resolve(file).await.is_ok()
    }

    /// Canonical path of `file`, refusing anything outside the directory.
    pub async fn resolve(&self, file: &HistoryFileRef) -> Result<PathBuf, HistoryError> {
        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|source| HistoryError::Enumerate { path: self.root.clone(), source })?;

        confine(&root, &file.path_buf()).await.map(|(path, _)| path)
    }
}

/// Canonicalize `requested` and accept it only as a visible regular file
/// directly inside the canonical `root`.
async fn confine(root: &Path, requested: &Path) -> Result<(PathBuf, Metadata), HistoryError> {
    let path = match fs::canonicalize(requested).await {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(HistoryError::Missing(requested.to_path_buf()));
        },
        Err(source) => return Err(HistoryError::Read { path: requested.to_path_buf(), source }),
    };

    let hidden = path.file_name().map_or(true, |name| is_hidden(&name.to_string_lossy()));
    if path.parent() != Some(root) || hidden {
        return Err(HistoryError::OutsideDirectory(requested.to_path_buf()));
    }

    match fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Ok((path, metadata)),
        Ok(_) => Err(HistoryError::OutsideDirectory(requested.to_path_buf())),
        Err(_) => Err(HistoryError::Missing(requested.to_path_buf())),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn created_at(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .into()
}
