// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! External renderer invocation for template files.

use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Default renderer executable.
pub const DEFAULT_RENDERER: &str = "php-cgi";

/// Turns one template file into artifact bytes.
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    /// Renders `file` and returns the artifact content.
    async fn render(&self, file: &Path) -> Result<Vec<u8>>;
}

/// Runs `<program> -f <file>` and captures its standard output.
///
/// There is no timeout: a renderer that never exits stalls the run.
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
    program: PathBuf,
}

impl ProcessRenderer {
    /// Creates a renderer for the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The renderer executable.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ProcessRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_RENDERER)
    }
}

#[async_trait]
impl Renderer for ProcessRenderer {
    async fn render(&self, file: &Path) -> Result<Vec<u8>> {
        let start = Instant::now();
        let output = Command::new(&self.program)
            .arg("-f")
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| BuildError::RendererSpawn {
                renderer: self.program.clone(),
                file: file.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuildError::RendererFailed {
                file: file.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::trace!("rendered {} in {:?}", file.display(), start.elapsed());
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // `sh -f script` runs the script with globbing disabled, which makes
    // it a convenient stand-in for `php-cgi -f page.php`.

    #[tokio::test]
    async fn test_captures_stdout() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.php");
        std::fs::write(&page, "echo '<h1>hello</h1>'\n").unwrap();

        let out = ProcessRenderer::new("sh").render(&page).await.unwrap();
        assert_eq!(out, b"<h1>hello</h1>\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("broken.php");
        std::fs::write(&page, "echo oops >&2\nexit 3\n").unwrap();

        let err = ProcessRenderer::new("sh").render(&page).await.unwrap_err();
        match err {
            BuildError::RendererFailed { file, stderr, .. } => {
                assert_eq!(file, page);
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let renderer = ProcessRenderer::new("/nonexistent/sitemirror-renderer");
        let err = renderer.render(Path::new("a.php")).await.unwrap_err();
        assert!(matches!(err, BuildError::RendererSpawn { .. }));
    }

    #[test]
    fn test_default_program() {
        assert_eq!(ProcessRenderer::default().program(), Path::new("php-cgi"));
    }
}
