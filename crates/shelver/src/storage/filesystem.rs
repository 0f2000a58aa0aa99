use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst` with `rename` only. Rename is atomic on
/// the same filesystem, so any failure leaves the source file intact and
/// never a partially written destination. Cross-device moves are not
/// supported: document locations and the share root are expected to live on
/// the same mount.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    // symlink_metadata so an existing broken symlink also counts as occupied.
    if std::fs::symlink_metadata(dst).is_ok() {
        return Err(StorageError::DestinationExists(dst.to_path_buf()));
    }

    std::fs::rename(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })
}

/// The only component that touches the filesystem. Thin synchronous
/// wrappers with no retry policy of their own.
pub struct FileStorage {
    root_directory: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root_directory: P) -> Self {
        Self {
            root_directory: root_directory.as_ref().to_path_buf(),
        }
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Creates the directory and all missing ancestors. Returns `true` if
    /// the directory was created, `false` if it already existed.
    pub fn ensure_directory(&self, path: &Path) -> Result<bool, StorageError> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(true)
    }

    pub fn move_file(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        move_file(src, dst)
    }
}
