//! Scratch Space
//!
//! A private temporary directory holding the files of one execution (or the
//! kernel's long-lived support files). Everything inside is removed when the
//! value is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Temporary directory owned by a single job or kernel
#[derive(Debug)]
pub struct ScratchSpace {
    id: String,
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a scratch directory under the system temp dir
    pub fn new() -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let dir = tempfile::Builder::new()
            .prefix("ckernel-")
            .tempdir()
            .map_err(|e| Error::ScratchSpaceFailed {
                path: std::env::temp_dir(),
                reason: e.to_string(),
            })?;

        trace!("Created scratch space {} at {}", id, dir.path().display());
        Ok(Self { id, dir })
    }

    /// Create a scratch directory under `base`
    pub fn new_in(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let id = Uuid::new_v4().to_string();
        let dir = tempfile::Builder::new()
            .prefix("ckernel-")
            .tempdir_in(base)
            .map_err(|e| Error::ScratchSpaceFailed {
                path: base.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self { id, dir })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the scratch directory (not created)
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` and return its path
    pub fn write_file(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.file_path(name);
        fs::write(&path, contents).map_err(|e| Error::ScratchSpaceFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| Error::ScratchSpaceFailed {
            path,
            reason: e.to_string(),
        })
    }
}
