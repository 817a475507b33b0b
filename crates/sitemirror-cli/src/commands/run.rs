// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Watch mode: build, then rebuild on every change.

use super::BuildOptions;
use crate::config::WatchBackend;
use crate::report::Reporter;
use crate::watcher::{EventFilter, FileWatcher};
use console::style;
use sitemirror::Coordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Watch mode overrides.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Watch backend.
    pub backend: Option<WatchBackend>,
    /// Debounce quiet period in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Runs watch mode until Ctrl+C.
pub async fn run(options: &BuildOptions, watch: &WatchOptions, quiet: bool) -> anyhow::Result<()> {
    let project = options.load()?;
    let config = &project.config;
    let backend = watch.backend.unwrap_or(config.watch.backend);
    let debounce = watch
        .debounce_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.debounce());

    let filter = EventFilter::new(
        project.source_root.clone(),
        project.output_root.clone(),
        config.rules()?,
        config.excludes()?,
    );
    let (watcher, notifications) = FileWatcher::start(backend, filter, config.poll_interval())?;

    if !quiet {
        println!(
            "  {} {}",
            style("Source:").cyan(),
            style(project.source_root.display()).dim()
        );
        println!(
            "  {} {}",
            style("Output:").cyan(),
            style(project.output_root.display()).dim()
        );
        println!(
            "  {} {}",
            style("Status:").cyan(),
            style("Watching for changes... (Ctrl+C to stop)").dim()
        );
        println!();
    }

    let reporter = Reporter::new(&project.source_root, quiet);
    let coordinator = Coordinator::new(Arc::new(project.pipeline))
        .with_debounce(debounce)
        .on_report(move |outcome| reporter.report(&outcome.kind, &outcome.result));

    tokio::select! {
        _ = coordinator.run(notifications) => {
            tracing::warn!("watcher stopped");
        }
        result = signal::ctrl_c() => {
            result?;
            if !quiet {
                println!("\nStopping...");
            }
        }
    }

    drop(watcher);
    Ok(())
}
