// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Source-root to output-root path mapping.

use crate::error::{BuildError, Result};
use crate::rules::ExtensionRules;
use std::path::{Component, Path, PathBuf};

/// One source file and the artifact it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// The source file.
    pub source: PathBuf,
    /// The mapped output file.
    pub dest: PathBuf,
}

/// Maps paths under the source root to their mirror under the output root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_root: PathBuf,
    output_root: PathBuf,
    rules: ExtensionRules,
}

impl PathMapper {
    /// Creates a mapper for the given roots. Relative roots are taken relative
    /// to the current directory.
    ///
    /// # Errors
    ///
    /// Rejects roots that are equal or where the source root lives inside the
    /// output root: a full rebuild deletes the output root, which would take
    /// the sources with it.
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        rules: ExtensionRules,
    ) -> Result<Self> {
        let source_root = absolute(source_root.into())?;
        let output_root = absolute(output_root.into())?;

        if source_root == output_root {
            return Err(BuildError::InvalidConfig(format!(
                "source and output roots are the same directory: {}",
                source_root.display()
            )));
        }
        if source_root.starts_with(&output_root) {
            return Err(BuildError::InvalidConfig(format!(
                "source root {} is inside output root {}",
                source_root.display(),
                output_root.display()
            )));
        }

        Ok(Self {
            source_root,
            output_root,
            rules,
        })
    }

    /// The source root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// The output root.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// The extension rules in use.
    pub fn rules(&self) -> &ExtensionRules {
        &self.rules
    }

    /// Resolves a possibly relative path against the source root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.source_root.join(path))
        }
    }

    /// Returns the mirrored location of a source directory.
    pub fn mirror_dir(&self, dir: &Path) -> Result<PathBuf> {
        Ok(self.output_root.join(self.relative(dir)?))
    }

    /// Builds the task for one source file, applying the output extension.
    pub fn task_for(&self, source: &Path) -> Result<FileTask> {
        let source = self.resolve(source);
        let dest = self.rules.output_path(&self.output_root.join(self.relative(&source)?));
        Ok(FileTask { source, dest })
    }

    /// True when `path` is the output root or below it.
    pub fn is_in_output(&self, path: &Path) -> bool {
        self.resolve(path).starts_with(&self.output_root)
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        let path = self.resolve(path);
        path.strip_prefix(&self.source_root)
            .map(Path::to_path_buf)
            .map_err(|_| BuildError::OutsideSourceRoot {
                path: path.clone(),
                root: self.source_root.clone(),
            })
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(&path));
    }
    let cwd = std::env::current_dir().map_err(|e| BuildError::io("current dir", &path, e))?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically removes `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
