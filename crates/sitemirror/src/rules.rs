// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File classification and extension rewriting.
//!
//! Three extensions drive a build:
//!
//! - the **template** extension (`php`): files rendered by the external renderer
//! - the **output** extension (`html`): what rendered templates are written as
//! - the **full rebuild** extensions (`html`): files other files may pull in,
//!   so a change to one of them rebuilds everything
//!
//! Static files keep their name but have every `.php` in their content
//! rewritten to `.html`, so links between pages keep working after rendering.

use crate::error::{BuildError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// How a source file becomes an output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Rendered by the external renderer.
    Template,
    /// Copied with the extension substitution applied to its content.
    Static,
}

/// What kind of run a change to a path calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// The whole output tree must be rebuilt.
    FullRebuild,
    /// Only the changed path needs rebuilding.
    SingleFile,
}

/// Extension rules shared by the walker, the transform engine and the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRules {
    template_ext: String,
    output_ext: String,
    full_rebuild_exts: Vec<String>,
}

impl Default for ExtensionRules {
    fn default() -> Self {
        Self {
            template_ext: "php".to_string(),
            output_ext: "html".to_string(),
            full_rebuild_exts: vec!["html".to_string()],
        }
    }
}

impl ExtensionRules {
    /// Creates a rule set. Leading dots on the extensions are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidConfig`] if an extension is empty or the
    /// template and output extensions are the same.
    pub fn new<S: AsRef<str>>(template_ext: &str, output_ext: &str, full_rebuild_exts: &[S]) -> Result<Self> {
        let template_ext = normalize_ext(template_ext);
        let output_ext = normalize_ext(output_ext);

        if template_ext.is_empty() || output_ext.is_empty() {
            return Err(BuildError::InvalidConfig(
                "template and output extensions must not be empty".to_string(),
            ));
        }
        if template_ext == output_ext {
            return Err(BuildError::InvalidConfig(format!(
                "template and output extensions are both '{}'",
                template_ext
            )));
        }

        let mut full = Vec::with_capacity(full_rebuild_exts.len());
        for ext in full_rebuild_exts {
            let ext = normalize_ext(ext.as_ref());
            if ext.is_empty() {
                return Err(BuildError::InvalidConfig(
                    "full rebuild extensions must not be empty".to_string(),
                ));
            }
            full.push(ext);
        }

        Ok(Self {
            template_ext,
            output_ext,
            full_rebuild_exts: full,
        })
    }

    /// Template extension without the leading dot.
    pub fn template_ext(&self) -> &str {
        &self.template_ext
    }

    /// Output extension without the leading dot.
    pub fn output_ext(&self) -> &str {
        &self.output_ext
    }

    /// Extensions whose changes trigger a full rebuild.
    pub fn full_rebuild_exts(&self) -> &[String] {
        &self.full_rebuild_exts
    }

    /// Classifies a source file by its extension.
    pub fn file_kind(&self, path: &Path) -> FileKind {
        if extension_is(path, &self.template_ext) {
            FileKind::Template
        } else {
            FileKind::Static
        }
    }

    /// Decides whether a change to `path` needs a full or a single-file rebuild.
    pub fn trigger_kind(&self, path: &Path) -> TriggerKind {
        if self
            .full_rebuild_exts
            .iter()
            .any(|ext| extension_is(path, ext))
        {
            TriggerKind::FullRebuild
        } else {
            TriggerKind::SingleFile
        }
    }

    /// Returns the output file name for a source path.
    ///
    /// Template files get the output extension; everything else is unchanged.
    pub fn output_path(&self, path: &Path) -> PathBuf {
        match self.file_kind(path) {
            FileKind::Template => path.with_extension(&self.output_ext),
            FileKind::Static => path.to_path_buf(),
        }
    }

    /// Rewrites every `.<template>` in `content` to `.<output>`.
    pub fn rewrite_content<'a>(&self, content: &'a str) -> Cow<'a, str> {
        let from = format!(".{}", self.template_ext);
        if content.contains(&from) {
            Cow::Owned(content.replace(&from, &format!(".{}", self.output_ext)))
        } else {
            Cow::Borrowed(content)
        }
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

fn extension_is(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
