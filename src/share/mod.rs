//! Access to the media share.
//!
//! The library never talks SMB itself: the share is mounted locally and read
//! through the [`ShareAccess`] collaborator, which lists files lazily so very
//! large shares are never held in memory at once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors raised while listing or reading the share.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// The root is missing, unmounted or unreadable.
    #[error("share unavailable at {path:?}: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// A single file or directory could not be read.
    #[error("failed to read {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },
}

impl ShareError {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Unavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// The path the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::Unavailable { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// A regular file found on the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
}

/// Lazy listing of files under a root. Per-file failures are yielded inline.
pub type ShareListing = Box<dyn Iterator<Item = Result<ShareFile, ShareError>> + Send>;

/// List and read files on the media share.
#[async_trait]
pub trait ShareAccess: Send + Sync {
    /// List every regular file below `root`, recursively.
    ///
    /// Fails up front with [`ShareError::Unavailable`] when `root` itself
    /// cannot be read.
    fn list_files(&self, root: &Path) -> Result<ShareListing, ShareError>;

    /// Read a file's bytes. Used by the playback path, not by scans.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, ShareError>;

    /// Check that `root` can be listed.
    fn check_available(&self, root: &Path) -> Result<(), ShareError> {
        self.list_files(root).map(drop)
    }
}

/// [`ShareAccess`] over a locally mounted directory.
#[derive(Debug, Clone, Default)]
pub struct LocalShare;

impl LocalShare {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShareAccess for LocalShare {
    fn list_files(&self, root: &Path) -> Result<ShareListing, ShareError> {
        let meta =
            std::fs::metadata(root).map_err(|e| ShareError::unavailable(root, e))?;
        if !meta.is_dir() {
            return Err(ShareError::unavailable(root, "not a directory"));
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                        return Some(Err(ShareError::io(path, e)));
                    }
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                Some(
                    entry
                        .metadata()
                        .map_err(|e| ShareError::io(entry.path(), e))
                        .and_then(|meta| {
                            let modified = meta
                                .modified()
                                .map_err(|e| ShareError::io(entry.path(), e))?;
                            Ok(ShareFile {
                                path: entry.path().to_path_buf(),
                                modified: DateTime::<Utc>::from(modified),
                                size: meta.len(),
                            })
                        }),
                )
            });

        Ok(Box::new(walker))
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, ShareError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| ShareError::io(path, e))
    }
}
