// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Full and single-path rebuilds.
//!
//! # Full rebuild
//!
//! 1. Delete and recreate the output root. Failure here aborts the run.
//! 2. Walk the source tree, mirroring every directory.
//! 3. Transform every file, at most `concurrency` at a time.
//!
//! # Single-path rebuild
//!
//! - a file is transformed in [`TransformMode::Replace`]
//! - a directory (freshly created or moved in) is mirrored and every file
//!   under it transformed
//! - a path that no longer exists has its artifact removed
//!
//! Per-file failures never abort a run. They are logged and returned in the
//! [`RunSummary`].

use crate::error::{BuildError, Result};
use crate::exclude::ExcludeSet;
use crate::fs::{BuildFs, EntryKind, TokioFs};
use crate::mapping::{FileTask, PathMapper};
use crate::render::{ProcessRenderer, Renderer};
use crate::transform::{TransformEngine, TransformMode};
use crate::walker::TreeWalker;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default number of files transformed at once during a full rebuild.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// What a run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    /// Reset the output root and rebuild everything.
    Full,
    /// Rebuild one changed path.
    Single(PathBuf),
}

impl RunKind {
    /// Folds a newer request into this one so that a single run covers both.
    ///
    /// A full rebuild is never downgraded. Two different single paths can
    /// only be covered together by a full rebuild.
    pub fn merge(self, next: RunKind) -> RunKind {
        match (self, next) {
            (RunKind::Full, _) | (_, RunKind::Full) => RunKind::Full,
            (RunKind::Single(a), RunKind::Single(b)) if a == b => RunKind::Single(a),
            _ => RunKind::Full,
        }
    }

    /// True for [`RunKind::Full`].
    pub fn is_full(&self) -> bool {
        matches!(self, RunKind::Full)
    }
}

/// Outcome of one run.
#[derive(Debug)]
pub struct RunSummary {
    /// What the run did.
    pub kind: RunKind,
    /// Number of files transformed (successfully or not).
    pub files: usize,
    /// Number of artifacts removed because their source is gone.
    pub removed: usize,
    /// Files that failed, with their error.
    pub failures: Vec<(PathBuf, BuildError)>,
    /// Directories skipped because they could not be read.
    pub skipped_dirs: usize,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// An empty summary for `kind`.
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            files: 0,
            removed: 0,
            failures: Vec::new(),
            skipped_dirs: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The build operations the coordinator drives.
#[async_trait]
pub trait BuildPipeline: Send + Sync + 'static {
    /// Resets the output root and rebuilds every source file.
    async fn full_rebuild(&self) -> Result<RunSummary>;

    /// Rebuilds one changed source path.
    async fn rebuild_path(&self, path: &Path) -> Result<RunSummary>;

    /// Dispatches on the run kind.
    async fn run(&self, kind: &RunKind) -> Result<RunSummary> {
        match kind {
            RunKind::Full => self.full_rebuild().await,
            RunKind::Single(path) => self.rebuild_path(path).await,
        }
    }
}

/// The real pipeline: a filesystem, a renderer and a path mapping.
pub struct Pipeline<F = TokioFs, R = ProcessRenderer> {
    fs: F,
    renderer: R,
    mapper: PathMapper,
    excludes: ExcludeSet,
    concurrency: usize,
}

impl<F: BuildFs, R: Renderer> Pipeline<F, R> {
    /// Creates a pipeline with no excludes and the default concurrency.
    pub fn new(fs: F, renderer: R, mapper: PathMapper) -> Self {
        Self {
            fs,
            renderer,
            mapper,
            excludes: ExcludeSet::empty(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the exclude patterns.
    pub fn with_excludes(mut self, excludes: ExcludeSet) -> Self {
        self.excludes = excludes;
        self
    }

    /// Sets how many files a full rebuild transforms at once.
    ///
    /// # Errors
    ///
    /// Zero is rejected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(BuildError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// The path mapping in use.
    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    async fn reset_output(&self) -> Result<()> {
        let root = self.mapper.output_root();
        match self.fs.remove_dir_all(root).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(reset_error(root, err)),
        }
        self.fs
            .create_dir_all(root)
            .await
            .map_err(|err| reset_error(root, err))
    }

    async fn transform_all(&self, tasks: &[FileTask], mode: TransformMode) -> Vec<(PathBuf, BuildError)> {
        for dest in colliding_dests(tasks) {
            tracing::warn!(
                "several source files map to {}; the result depends on build order",
                dest.display()
            );
        }

        let engine = TransformEngine::new(&self.fs, &self.renderer, self.mapper.rules());
        let engine = &engine;

        let results: Vec<(&FileTask, Result<()>)> = stream::iter(tasks)
            .map(|task| async move { (task, engine.transform(task, mode).await) })
            .boxed()
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|(task, result)| match result {
                Ok(()) => {
                    tracing::trace!("built {}", task.dest.display());
                    None
                }
                Err(err) => {
                    tracing::error!("failed to build {}: {}", task.source.display(), err);
                    Some((task.source.clone(), err))
                }
            })
            .collect()
    }

    async fn rebuild_dir(&self, dir: &Path, summary: &mut RunSummary) {
        let walk = TreeWalker::new(&self.fs, &self.mapper, &self.excludes)
            .walk(dir)
            .await;
        summary.files = walk.tasks.len();
        summary.skipped_dirs = walk.skipped.len();
        summary.failures = self.transform_all(&walk.tasks, TransformMode::Replace).await;
    }

    async fn rebuild_file(&self, path: &Path, summary: &mut RunSummary) -> Result<()> {
        let task = self.mapper.task_for(path)?;
        summary.files = 1;

        if let Some(parent) = task.dest.parent() {
            if let Err(err) = self.fs.create_dir_all(parent).await {
                summary.failures.push((task.source.clone(), err));
                return Ok(());
            }
        }

        let engine = TransformEngine::new(&self.fs, &self.renderer, self.mapper.rules());
        if let Err(err) = engine.transform(&task, TransformMode::Replace).await {
            tracing::error!("failed to build {}: {}", task.source.display(), err);
            summary.failures.push((task.source, err));
        }
        Ok(())
    }

    async fn remove_artifact(&self, path: &Path, summary: &mut RunSummary) -> Result<()> {
        let mirror = self.mapper.mirror_dir(path)?;
        let removed = match self.fs.stat(&mirror).await {
            Ok(EntryKind::Dir) => self.fs.remove_dir_all(&mirror).await,
            _ => {
                let task = self.mapper.task_for(path)?;
                TransformEngine::new(&self.fs, &self.renderer, self.mapper.rules())
                    .remove(&task)
                    .await
            }
        };

        match removed {
            Ok(()) => {
                tracing::debug!("removed artifact of {}", path.display());
                summary.removed = 1;
            }
            Err(err) => summary.failures.push((path.to_path_buf(), err)),
        }
        Ok(())
    }
}

#[async_trait]
impl<F: BuildFs, R: Renderer> BuildPipeline for Pipeline<F, R> {
    async fn full_rebuild(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new(RunKind::Full);

        self.reset_output().await?;

        let walk = TreeWalker::new(&self.fs, &self.mapper, &self.excludes)
            .walk(self.mapper.source_root())
            .await;
        summary.files = walk.tasks.len();
        summary.skipped_dirs = walk.skipped.len();
        summary.failures = self.transform_all(&walk.tasks, TransformMode::Fresh).await;
        summary.elapsed = start.elapsed();

        tracing::info!(
            "full rebuild: {} file(s), {} failed, {:?}",
            summary.files,
            summary.failures.len(),
            summary.elapsed
        );
        Ok(summary)
    }

    async fn rebuild_path(&self, path: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        let path = self.mapper.resolve(path);
        let mut summary = RunSummary::new(RunKind::Single(path.clone()));

        if self.mapper.is_in_output(&path)
            || self.excludes.is_excluded(self.mapper.source_root(), &path)
        {
            tracing::debug!("ignoring change to {}", path.display());
            return Ok(summary);
        }

        match self.fs.stat(&path).await {
            Ok(EntryKind::File) => self.rebuild_file(&path, &mut summary).await?,
            Ok(EntryKind::Dir) => self.rebuild_dir(&path, &mut summary).await,
            Ok(EntryKind::Other) => {
                tracing::debug!("ignoring special file {}", path.display());
            }
            Err(err) if err.is_not_found() => self.remove_artifact(&path, &mut summary).await?,
            Err(err) => summary.failures.push((path.clone(), err)),
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            "rebuilt {}: {} file(s), {} failed, {:?}",
            path.display(),
            summary.files,
            summary.failures.len(),
            summary.elapsed
        );
        Ok(summary)
    }
}

/// Destinations that more than one task writes, in first-seen order.
fn colliding_dests(tasks: &[FileTask]) -> Vec<&Path> {
    let mut seen = HashSet::new();
    let mut colliding = Vec::new();
    for task in tasks {
        let dest = task.dest.as_path();
        if !seen.insert(dest) && !colliding.contains(&dest) {
            colliding.push(dest);
        }
    }
    colliding
}

fn reset_error(root: &Path, err: BuildError) -> BuildError {
    match err {
        BuildError::Io { source, .. } => BuildError::OutputReset {
            path: root.to_path_buf(),
            source,
        },
        other => other,
    }
}
