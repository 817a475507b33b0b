// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for mirror builds.
//!
//! # Error Categories
//!
//! - **Configuration errors**: roots or extension rules that cannot work
//! - **IO errors**: a filesystem operation failed on a specific path
//! - **Render errors**: the external renderer could not be spawned or exited non-zero
//! - **Reset errors**: the output root could not be cleared before a full rebuild
//!
//! Only reset errors abort a run. Everything else is reported per file and
//! the run carries on.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for build operations.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A filesystem operation failed.
    #[error("{op} {}: {source}", path.display())]
    Io {
        /// The operation that failed ("read", "write", "stat", ...).
        op: &'static str,
        /// The path the operation was applied to.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer process could not be started.
    #[error("failed to spawn renderer {} for {}: {source}", renderer.display(), file.display())]
    RendererSpawn {
        /// Renderer executable.
        renderer: PathBuf,
        /// Template file being rendered.
        file: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran but exited unsuccessfully.
    #[error("renderer failed on {} ({status}): {stderr}", file.display())]
    RendererFailed {
        /// Template file being rendered.
        file: PathBuf,
        /// Exit status description.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Clearing or recreating the output root failed.
    #[error("could not reset output root {}: {source}", path.display())]
    OutputReset {
        /// The output root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A path handed to the pipeline does not live under the source root.
    #[error("{} is outside the source root {}", path.display(), root.display())]
    OutsideSourceRoot {
        /// The offending path.
        path: PathBuf,
        /// The source root.
        root: PathBuf,
    },

    /// The build configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An exclude pattern did not compile.
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// A spawned run task panicked or was aborted.
    #[error("build task failed: {0}")]
    Task(String),
}

impl BuildError {
    /// Wraps an IO error with the operation and path it came from.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BuildError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true when the error is an IO "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BuildError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_names_path() {
        let err = BuildError::io(
            "read",
            "src/a.php",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "read src/a.php: gone");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_renderer_failure_keeps_stderr() {
        let err = BuildError::RendererFailed {
            file: PathBuf::from("a.php"),
            status: "exit status: 255".to_string(),
            stderr: "PHP Parse error".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.php"));
        assert!(msg.contains("PHP Parse error"));
        assert!(!err.is_not_found());
    }
}
