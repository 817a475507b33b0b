// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system watching for watch mode.
//!
//! This module provides `FileWatcher`, which turns filesystem events under
//! the source root into [`ChangeNotification`]s on a tokio channel.
//!
//! # Features
//!
//! - Three backends: native recursive, native per-directory, polling
//! - Drops access events, paths under the output root and excluded paths
//! - No debouncing here; the coordinator owns that
//!
//! Dropping the `FileWatcher` stops watching and closes the channel.

use crate::config::WatchBackend;
use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};
use notify::{Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use sitemirror::{ChangeNotification, ExcludeSet, ExtensionRules};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Decides which filesystem events become change notifications.
#[derive(Debug, Clone)]
pub struct EventFilter {
    source_root: PathBuf,
    output_root: PathBuf,
    rules: ExtensionRules,
    excludes: ExcludeSet,
}

impl EventFilter {
    /// Creates a filter for the given roots. Both roots must be absolute.
    pub fn new(
        source_root: PathBuf,
        output_root: PathBuf,
        rules: ExtensionRules,
        excludes: ExcludeSet,
    ) -> Self {
        Self {
            source_root,
            output_root,
            rules,
            excludes,
        }
    }

    /// The watched root.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// True when a change to `path` is relevant to the build.
    pub fn accepts(&self, path: &Path) -> bool {
        path.starts_with(&self.source_root)
            && path != self.source_root
            && !path.starts_with(&self.output_root)
            && !self.excludes.is_excluded(&self.source_root, path)
    }

    /// Turns one event into zero or more notifications.
    pub fn classify(&self, event: &Event) -> Vec<ChangeNotification> {
        if matches!(event.kind, EventKind::Access(_)) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter(|path| self.accepts(path))
            .map(|path| ChangeNotification::classify(path.clone(), &self.rules))
            .collect()
    }

    /// Every directory from `start` down that should be watched, including
    /// `start` itself.
    fn directories(&self, start: &Path) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        let mut queue = VecDeque::from([start.to_path_buf()]);
        while let Some(dir) = queue.pop_front() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!("cannot watch {}: {}", dir.display(), err);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() && self.accepts(&path) {
                    queue.push_back(path);
                }
            }
            dirs.push(dir);
        }
        dirs
    }
}

#[allow(dead_code)]
enum Backend {
    Recursive(RecommendedWatcher),
    PerDirectory(Arc<Mutex<RecommendedWatcher>>),
    Poll(PollWatcher),
}

/// Watches the source tree for the life of the value.
pub struct FileWatcher {
    backend: Backend,
}

impl FileWatcher {
    /// Starts watching and returns the watcher with its notification stream.
    ///
    /// Must be called inside a tokio runtime when `backend` is
    /// [`WatchBackend::PerDirectory`].
    pub fn start(
        backend: WatchBackend,
        filter: EventFilter,
        poll_interval: Duration,
    ) -> anyhow::Result<(Self, UnboundedReceiver<ChangeNotification>)> {
        let (tx, rx) = unbounded_channel();
        let root = filter.source_root.clone();

        let backend = match backend {
            WatchBackend::Recursive => {
                let mut watcher = notify::recommended_watcher(forward(filter, tx, None))?;
                watcher.watch(&root, RecursiveMode::Recursive)?;
                Backend::Recursive(watcher)
            }
            WatchBackend::PerDirectory => {
                let (dir_tx, dir_rx) = unbounded_channel();
                let dirs = filter.directories(&root);
                let watcher = notify::recommended_watcher(forward(filter.clone(), tx, Some(dir_tx)))?;
                let watcher = Arc::new(Mutex::new(watcher));
                for dir in &dirs {
                    subscribe(&watcher, dir);
                }
                tokio::spawn(subscribe_new_dirs(Arc::downgrade(&watcher), filter, dir_rx));
                Backend::PerDirectory(watcher)
            }
            WatchBackend::Poll => {
                let config = notify::Config::default().with_poll_interval(poll_interval);
                let mut watcher = PollWatcher::new(forward(filter, tx, None), config)?;
                watcher.watch(&root, RecursiveMode::Recursive)?;
                Backend::Poll(watcher)
            }
        };

        tracing::debug!("watching {} ({})", root.display(), backend_name(&backend));
        Ok((Self { backend }, rx))
    }
}

fn backend_name(backend: &Backend) -> &'static str {
    match backend {
        Backend::Recursive(_) => "recursive",
        Backend::PerDirectory(_) => "per-directory",
        Backend::Poll(_) => "poll",
    }
}

/// Paths an event brings into the tree as new entries: created paths and
/// rename targets.
fn arrivals(event: &Event) -> &[PathBuf] {
    match event.kind {
        EventKind::Create(CreateKind::Folder | CreateKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &event.paths,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().map(std::slice::from_ref).unwrap_or(&[])
        }
        _ => &[],
    }
}

/// The notify event handler: classify and send. When `new_dirs` is set,
/// directories created or moved in are also reported there for subscription.
fn forward(
    filter: EventFilter,
    tx: UnboundedSender<ChangeNotification>,
    new_dirs: Option<UnboundedSender<PathBuf>>,
) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |result| match result {
        Ok(event) => {
            if let Some(new_dirs) = &new_dirs {
                for path in arrivals(&event).iter().filter(|p| p.is_dir() && filter.accepts(p)) {
                    let _ = new_dirs.send(path.clone());
                }
            }
            for notification in filter.classify(&event) {
                let _ = tx.send(notification);
            }
        }
        Err(err) => tracing::warn!("watch error: {}", err),
    }
}

fn subscribe(watcher: &Mutex<RecommendedWatcher>, dir: &Path) {
    let Ok(mut watcher) = watcher.lock() else {
        return;
    };
    if let Err(err) = watcher.watch(dir, RecursiveMode::NonRecursive) {
        tracing::warn!("cannot watch {}: {}", dir.display(), err);
    }
}

/// Subscribes directories created after startup, together with anything
/// already inside them. Ends when the watcher is dropped.
async fn subscribe_new_dirs(
    watcher: Weak<Mutex<RecommendedWatcher>>,
    filter: EventFilter,
    mut new_dirs: UnboundedReceiver<PathBuf>,
) {
    while let Some(dir) = new_dirs.recv().await {
        let walker = filter.clone();
        let dirs = match tokio::task::spawn_blocking(move || walker.directories(&dir)).await {
            Ok(dirs) => dirs,
            Err(err) => {
                tracing::warn!("directory scan failed: {}", err);
                continue;
            }
        };
        let Some(watcher) = watcher.upgrade() else {
            break;
        };
        for sub in dirs {
            tracing::debug!("watching new directory {}", sub.display());
            subscribe(&watcher, &sub);
        }
    }
}
