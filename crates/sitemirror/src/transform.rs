// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Turning one source file into one output artifact.
//!
//! Template files go through the renderer and its output is appended to the
//! mapped `.html` path. Static files are read, get every `.php` in their
//! content rewritten to `.html`, and are written to the same relative path.
//! Content that is not UTF-8 (images, fonts) is copied byte for byte.
//!
//! Invocations never read each other's output, so any number can run at once.

use crate::error::Result;
use crate::fs::BuildFs;
use crate::mapping::FileTask;
use crate::render::Renderer;
use crate::rules::{ExtensionRules, FileKind};

/// Whether the destination may already hold an artifact from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    /// The output root was just recreated; nothing to replace.
    Fresh,
    /// A previous artifact may exist and is replaced.
    Replace,
}

/// Applies the per-file transformation.
pub struct TransformEngine<'a, F: BuildFs + ?Sized, R: Renderer + ?Sized> {
    fs: &'a F,
    renderer: &'a R,
    rules: &'a ExtensionRules,
}

impl<'a, F: BuildFs + ?Sized, R: Renderer + ?Sized> TransformEngine<'a, F, R> {
    /// Creates an engine.
    pub fn new(fs: &'a F, renderer: &'a R, rules: &'a ExtensionRules) -> Self {
        Self { fs, renderer, rules }
    }

    /// Produces the artifact for `task`.
    pub async fn transform(&self, task: &FileTask, mode: TransformMode) -> Result<()> {
        match self.rules.file_kind(&task.source) {
            FileKind::Template => {
                let rendered = self.renderer.render(&task.source).await?;
                if mode == TransformMode::Replace {
                    self.remove_existing(task).await?;
                }
                self.fs.append(&task.dest, &rendered).await
            }
            FileKind::Static => {
                let bytes = self.fs.read(&task.source).await?;
                match String::from_utf8(bytes) {
                    Ok(text) => {
                        let text = self.rules.rewrite_content(&text);
                        self.fs.write(&task.dest, text.as_bytes()).await
                    }
                    Err(raw) => self.fs.write(&task.dest, raw.as_bytes()).await,
                }
            }
        }
    }

    /// Removes the artifact of a source file that no longer exists.
    pub async fn remove(&self, task: &FileTask) -> Result<()> {
        self.remove_existing(task).await
    }

    async fn remove_existing(&self, task: &FileTask) -> Result<()> {
        match self.fs.remove_file(&task.dest).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::fs::TokioFs;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    /// Renders a template as its own file name.
    struct NameRenderer;

    #[async_trait]
    impl Renderer for NameRenderer {
        async fn render(&self, file: &Path) -> Result<Vec<u8>> {
            let name = file.file_name().unwrap().to_string_lossy();
            Ok(format!("<p>{}</p>", name).into_bytes())
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl Renderer for FailingRenderer {
        async fn render(&self, file: &Path) -> Result<Vec<u8>> {
            Err(BuildError::RendererFailed {
                file: file.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr: String::new(),
            })
        }
    }

    fn task(dir: &Path, source: &str, dest: &str) -> FileTask {
        FileTask {
            source: dir.join(source),
            dest: dir.join(dest),
        }
    }

    #[tokio::test]
    async fn test_template_is_rendered() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.php"), "<?php ?>").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);

        engine
            .transform(&task(dir.path(), "a.php", "a.html"), TransformMode::Fresh)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.html")).unwrap(), "<p>a.php</p>");
    }

    #[tokio::test]
    async fn test_replace_mode_drops_previous_artifact() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.php"), "<?php ?>").unwrap();
        std::fs::write(dir.path().join("a.html"), "stale").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);
        let t = task(dir.path(), "a.php", "a.html");

        engine.transform(&t, TransformMode::Replace).await.unwrap();
        engine.transform(&t, TransformMode::Replace).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.html")).unwrap(), "<p>a.php</p>");
    }

    #[tokio::test]
    async fn test_replace_mode_without_previous_artifact() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("new.php"), "").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);

        engine
            .transform(&task(dir.path(), "new.php", "new.html"), TransformMode::Replace)
            .await
            .unwrap();
        assert!(dir.path().join("new.html").exists());
    }

    #[tokio::test]
    async fn test_failed_render_keeps_previous_artifact() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.php"), "").unwrap();
        std::fs::write(dir.path().join("a.html"), "previous").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &FailingRenderer, &rules);

        let err = engine
            .transform(&task(dir.path(), "a.php", "a.html"), TransformMode::Replace)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::RendererFailed { .. }));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.html")).unwrap(), "previous");
    }

    #[tokio::test]
    async fn test_static_file_content_substitution() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        std::fs::write(
            dir.path().join("nav.js"),
            "go('a.php'); go('b.php'); go('c.txt');",
        )
        .unwrap();
        std::fs::write(dir.path().join("plain.txt"), "nothing to see").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);

        engine
            .transform(&task(dir.path(), "nav.js", "out/nav.js"), TransformMode::Fresh)
            .await
            .unwrap();
        engine
            .transform(&task(dir.path(), "plain.txt", "out/plain.txt"), TransformMode::Fresh)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/nav.js")).unwrap(),
            "go('a.html'); go('b.html'); go('c.txt');"
        );
        assert_eq!(
            std::fs::read(dir.path().join("out/plain.txt")).unwrap(),
            std::fs::read(dir.path().join("plain.txt")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_binary_file_copied_verbatim() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        let bytes: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0xff, 0xfe, b'.', b'p', b'h', b'p'];
        std::fs::write(dir.path().join("logo.png"), &bytes).unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);

        engine
            .transform(&task(dir.path(), "logo.png", "out/logo.png"), TransformMode::Fresh)
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("out/logo.png")).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);

        let err = engine
            .transform(&task(dir.path(), "gone.txt", "gone-out.txt"), TransformMode::Fresh)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.html"), "x").unwrap();
        let rules = ExtensionRules::default();
        let engine = TransformEngine::new(&TokioFs, &NameRenderer, &rules);
        let t = FileTask {
            source: PathBuf::from("old.php"),
            dest: dir.path().join("old.html"),
        };

        engine.remove(&t).await.unwrap();
        engine.remove(&t).await.unwrap();
        assert!(!dir.path().join("old.html").exists());
    }
}
