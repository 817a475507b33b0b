// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Filesystem access for the build pipeline.
//!
//! The pipeline never touches `std::fs` or `tokio::fs` directly. It goes
//! through [`BuildFs`], so tests can count or fail individual operations.
//!
//! # Implementations
//!
//! - [`TokioFs`]: the real filesystem via `tokio::fs`
//!
//! Every error is wrapped in [`BuildError::Io`] carrying the operation name
//! and the path, so a failure in a large fan-out can be traced to its file.

use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// What a path points at, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// Anything else (sockets, fifos, devices).
    Other,
}

/// Async filesystem operations used by the walker, transform engine and pipeline.
#[async_trait]
pub trait BuildFs: Send + Sync + 'static {
    /// Lists the direct children of `dir` as full paths.
    async fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Classifies `path`.
    async fn stat(&self, path: &Path) -> Result<EntryKind>;

    /// Reads the whole file.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Creates or truncates `path` and writes `contents`.
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Appends `contents` to `path`, creating it if needed.
    async fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Creates `path` and any missing parents. Existing directories are fine.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Removes a directory tree.
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Removes a single file.
    async fn remove_file(&self, path: &Path) -> Result<()>;
}

/// [`BuildFs`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl BuildFs for TokioFs {
    async fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| BuildError::io("read dir", dir, e))?;

        let mut children = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BuildError::io("read dir", dir, e))?
        {
            children.push(entry.path());
        }
        Ok(children)
    }

    async fn stat(&self, path: &Path) -> Result<EntryKind> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| BuildError::io("stat", path, e))?;

        Ok(if meta.is_dir() {
            EntryKind::Dir
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| BuildError::io("read", path, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| BuildError::io("write", path, e))
    }

    async fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| BuildError::io("open", path, e))?;
        file.write_all(contents)
            .await
            .map_err(|e| BuildError::io("append", path, e))?;
        file.flush()
            .await
            .map_err(|e| BuildError::io("append", path, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| BuildError::io("create dir", path, e))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| BuildError::io("remove dir", path, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| BuildError::io("remove", path, e))
    }
}
