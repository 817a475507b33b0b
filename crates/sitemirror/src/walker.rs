// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Breadth-first source tree traversal.
//!
//! The walker keeps a queue of directories, starting with the one it is
//! given. For each directory it lists the children, stats them all at once,
//! queues subdirectories and collects files, then makes sure the mirrored
//! output directory exists before moving on. By the time the walk returns,
//! every directory that holds a collected file has a mirror.
//!
//! Traversal is best-effort: an unreadable directory is logged and its
//! subtree skipped, the rest of the tree is still walked.

use crate::exclude::ExcludeSet;
use crate::fs::{BuildFs, EntryKind};
use crate::mapping::{FileTask, PathMapper};
use futures_util::future::join_all;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Result of a walk.
#[derive(Debug, Default)]
pub struct Walk {
    /// One task per regular file found, in discovery order.
    pub tasks: Vec<FileTask>,
    /// Directories that could not be read and were skipped with their subtree.
    pub skipped: Vec<PathBuf>,
}

/// Walks a source tree and mirrors its directories into the output tree.
pub struct TreeWalker<'a, F: BuildFs + ?Sized> {
    fs: &'a F,
    mapper: &'a PathMapper,
    excludes: &'a ExcludeSet,
}

impl<'a, F: BuildFs + ?Sized> TreeWalker<'a, F> {
    /// Creates a walker.
    pub fn new(fs: &'a F, mapper: &'a PathMapper, excludes: &'a ExcludeSet) -> Self {
        Self {
            fs,
            mapper,
            excludes,
        }
    }

    /// Walks everything below `start`, which must be the source root or a
    /// directory under it.
    pub async fn walk(&self, start: &Path) -> Walk {
        let mut walk = Walk::default();
        let mut queue = VecDeque::from([self.mapper.resolve(start)]);

        while let Some(dir) = queue.pop_front() {
            let children = match self.fs.read_dir(&dir).await {
                Ok(children) => children,
                Err(err) => {
                    tracing::warn!("skipping {}: {}", dir.display(), err);
                    walk.skipped.push(dir);
                    continue;
                }
            };

            let children: Vec<PathBuf> = children
                .into_iter()
                .filter(|child| !self.is_ignored(child))
                .collect();
            let kinds = join_all(children.iter().map(|child| self.fs.stat(child))).await;

            for (child, kind) in children.into_iter().zip(kinds) {
                match kind {
                    Ok(EntryKind::Dir) => queue.push_back(child),
                    Ok(EntryKind::File) => match self.mapper.task_for(&child) {
                        Ok(task) => walk.tasks.push(task),
                        Err(err) => tracing::warn!("skipping {}: {}", child.display(), err),
                    },
                    Ok(EntryKind::Other) => {
                        tracing::debug!("ignoring special file {}", child.display());
                    }
                    // Removed between listing and stat
                    Err(err) => tracing::warn!("skipping {}: {}", child.display(), err),
                }
            }

            match self.mapper.mirror_dir(&dir) {
                Ok(mirror) => {
                    if let Err(err) = self.fs.create_dir_all(&mirror).await {
                        tracing::warn!("could not mirror {}: {}", dir.display(), err);
                    }
                }
                Err(err) => tracing::warn!("could not mirror {}: {}", dir.display(), err),
            }
        }

        tracing::debug!(
            "walked {}: {} file(s), {} skipped dir(s)",
            start.display(),
            walk.tasks.len(),
            walk.skipped.len()
        );
        walk
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.mapper.is_in_output(path) || self.excludes.is_excluded(self.mapper.source_root(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BuildError, Result};
    use crate::fs::TokioFs;
    use crate::rules::ExtensionRules;
    use async_trait::async_trait;
    use tempfile::tempdir;

    fn sorted_sources(walk: &Walk) -> Vec<PathBuf> {
        let mut sources: Vec<_> = walk.tasks.iter().map(|t| t.source.clone()).collect();
        sources.sort();
        sources
    }

    #[tokio::test]
    async fn test_walk_mirrors_directories() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        std::fs::create_dir_all(src.join("sub/deeper")).unwrap();
        std::fs::create_dir_all(src.join("empty")).unwrap();
        std::fs::write(src.join("a.php"), "").unwrap();
        std::fs::write(src.join("b.txt"), "").unwrap();
        std::fs::write(src.join("sub/c.php"), "").unwrap();
        std::fs::write(src.join("sub/deeper/d.css"), "").unwrap();

        let mapper = PathMapper::new(&src, &out, ExtensionRules::default()).unwrap();
        let excludes = ExcludeSet::empty();
        let walk = TreeWalker::new(&TokioFs, &mapper, &excludes).walk(&src).await;

        assert_eq!(
            sorted_sources(&walk),
            vec![
                src.join("a.php"),
                src.join("b.txt"),
                src.join("sub/c.php"),
                src.join("sub/deeper/d.css"),
            ]
        );
        assert!(walk.skipped.is_empty());
        assert!(out.join("sub/deeper").is_dir());
        assert!(out.join("empty").is_dir());

        let c = walk.tasks.iter().find(|t| t.source.ends_with("c.php")).unwrap();
        assert_eq!(c.dest, out.join("sub/c.html"));
    }

    #[tokio::test]
    async fn test_walk_is_breadth_first() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("a/b")).unwrap();
        std::fs::write(src.join("a/b/deep.txt"), "").unwrap();
        std::fs::write(src.join("a/mid.txt"), "").unwrap();
        std::fs::write(src.join("top.txt"), "").unwrap();

        let mapper = PathMapper::new(&src, dir.path().join("out"), ExtensionRules::default()).unwrap();
        let excludes = ExcludeSet::empty();
        let walk = TreeWalker::new(&TokioFs, &mapper, &excludes).walk(&src).await;

        let order: Vec<_> = walk.tasks.iter().map(|t| t.source.clone()).collect();
        assert_eq!(
            order,
            vec![src.join("top.txt"), src.join("a/mid.txt"), src.join("a/b/deep.txt")]
        );
    }

    #[tokio::test]
    async fn test_walk_skips_output_and_excluded_paths() {
        let dir = tempdir().unwrap();
        let src = dir.path().to_path_buf();
        let out = src.join("_site");
        std::fs::create_dir_all(out.join("old")).unwrap();
        std::fs::write(out.join("old/stale.html"), "").unwrap();
        std::fs::create_dir_all(src.join(".git")).unwrap();
        std::fs::write(src.join(".git/HEAD"), "").unwrap();
        std::fs::write(src.join("index.php"), "").unwrap();
        std::fs::write(src.join(".index.php.swp"), "").unwrap();

        let mapper = PathMapper::new(&src, &out, ExtensionRules::default()).unwrap();
        let excludes = ExcludeSet::new(&[".git", "**/*.swp"]).unwrap();
        let walk = TreeWalker::new(&TokioFs, &mapper, &excludes).walk(&src).await;

        assert_eq!(sorted_sources(&walk), vec![src.join("index.php")]);
        assert!(!out.join(".git").exists());
        assert!(!out.join("_site").exists());
    }

    /// Real filesystem except that one directory refuses to be listed.
    struct Unreadable(PathBuf);

    #[async_trait]
    impl BuildFs for Unreadable {
        async fn read_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            if dir == self.0 {
                return Err(BuildError::io(
                    "read dir",
                    dir,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ));
            }
            TokioFs.read_dir(dir).await
        }
        async fn stat(&self, path: &Path) -> Result<EntryKind> {
            TokioFs.stat(path).await
        }
        async fn read(&self, path: &Path) -> Result<Vec<u8>> {
            TokioFs.read(path).await
        }
        async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
            TokioFs.write(path, contents).await
        }
        async fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
            TokioFs.append(path, contents).await
        }
        async fn create_dir_all(&self, path: &Path) -> Result<()> {
            TokioFs.create_dir_all(path).await
        }
        async fn remove_dir_all(&self, path: &Path) -> Result<()> {
            TokioFs.remove_dir_all(path).await
        }
        async fn remove_file(&self, path: &Path) -> Result<()> {
            TokioFs.remove_file(path).await
        }
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_skipped() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        std::fs::create_dir_all(src.join("locked/inner")).unwrap();
        std::fs::create_dir_all(src.join("open")).unwrap();
        std::fs::write(src.join("locked/inner/x.txt"), "").unwrap();
        std::fs::write(src.join("open/y.txt"), "").unwrap();

        let mapper = PathMapper::new(&src, &out, ExtensionRules::default()).unwrap();
        let excludes = ExcludeSet::empty();
        let fs = Unreadable(src.join("locked"));
        let walk = TreeWalker::new(&fs, &mapper, &excludes).walk(&src).await;

        assert_eq!(sorted_sources(&walk), vec![src.join("open/y.txt")]);
        assert_eq!(walk.skipped, vec![src.join("locked")]);
        assert!(out.join("open").is_dir());
        assert!(!out.join("locked").exists());
    }

    #[tokio::test]
    async fn test_walk_subtree() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let out = dir.path().join("out");
        std::fs::create_dir_all(src.join("new/nested")).unwrap();
        std::fs::write(src.join("new/nested/page.php"), "").unwrap();
        std::fs::write(src.join("root.txt"), "").unwrap();

        let mapper = PathMapper::new(&src, &out, ExtensionRules::default()).unwrap();
        let excludes = ExcludeSet::empty();
        let walk = TreeWalker::new(&TokioFs, &mapper, &excludes)
            .walk(&src.join("new"))
            .await;

        assert_eq!(sorted_sources(&walk), vec![src.join("new/nested/page.php")]);
        assert!(out.join("new/nested").is_dir());
        assert!(!out.join("root.txt").exists());
    }
}
