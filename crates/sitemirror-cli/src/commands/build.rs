// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! One-shot build command.

use super::BuildOptions;
use crate::report::Reporter;
use console::style;
use sitemirror::{BuildPipeline, RunKind};

/// Runs a single full rebuild.
///
/// # Errors
///
/// Returns an error when the output root cannot be reset or any file fails,
/// so the process exits non-zero.
pub async fn run(options: &BuildOptions, quiet: bool) -> anyhow::Result<()> {
    let project = options.load()?;

    if !quiet {
        println!(
            "{} {} {} {}",
            style("Building").cyan(),
            style(project.source_root.display()).dim(),
            style("→").dim(),
            style(project.output_root.display()).dim()
        );
    }

    let result = project.pipeline.full_rebuild().await;
    Reporter::new(&project.source_root, quiet).report(&RunKind::Full, &result);

    let summary = result?;
    if !summary.is_success() {
        anyhow::bail!("{} file(s) failed to build", summary.failures.len());
    }
    Ok(())
}
