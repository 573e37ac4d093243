//! Scoped temporary files for incoming uploads.
//!
//! Content is written to a named temp file so the repository can ingest it
//! by path. The file is deleted when the [`StagedFile`] is dropped, so every
//! exit path (success, `?`, panic unwinding) removes it.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::error::DavResult;

/// Filename prefix for staged uploads.
pub const STAGING_PREFIX: &str = "asset-dav-tmp-file-";

/// Where uploads are staged.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `content` into a fresh temp file.
    pub fn stage(&self, content: &mut dyn Read) -> DavResult<StagedFile> {
        let mut file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.dir)?;
        let written = io::copy(content, &mut file)?;
        file.flush()?;
        tracing::trace!(path = %file.path().display(), bytes = written, "staged upload");
        Ok(StagedFile { file, len: written })
    }
}

/// A staged upload; removed from disk on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    len: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove the file now, logging rather than failing if removal errors.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove staged upload");
        }
    }
}
