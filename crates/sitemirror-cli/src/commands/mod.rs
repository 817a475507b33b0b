// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `build`: one full rebuild, then exit
//! - `run`: full rebuild, then rebuild on every change until Ctrl+C

/// One-shot build command.
pub mod build;
/// Watch mode command.
pub mod run;

use crate::config::{resolve_dir, Config};
use clap::Args;
use sitemirror::{PathMapper, Pipeline, ProcessRenderer, TokioFs};
use std::path::PathBuf;

/// Arguments shared by `run` and `build`.
#[derive(Debug, Clone, Args)]
pub struct BuildOptions {
    /// Source directory name, resolved against the base directory
    pub source: String,

    /// Output directory name, resolved against the base directory
    pub output: String,

    /// Directory both names are resolved against (defaults to the current directory)
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Configuration file (defaults to sitemirror.toml in the base directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Renderer executable, invoked as `<renderer> -f <file>`
    #[arg(long)]
    pub renderer: Option<String>,

    /// Files transformed at once during a full rebuild
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Everything a command needs once configuration and flags are merged.
pub struct Project {
    /// Merged configuration.
    pub config: Config,
    /// Absolute source root.
    pub source_root: PathBuf,
    /// Absolute output root.
    pub output_root: PathBuf,
    /// The pipeline over the real filesystem and renderer.
    pub pipeline: Pipeline,
}

impl BuildOptions {
    /// Loads configuration, applies flag overrides and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Fails on unreadable configuration, unusable roots or invalid build
    /// settings. Nothing is built when this fails.
    pub fn load(&self) -> anyhow::Result<Project> {
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let mut config = Config::load(&base_dir, self.config.as_deref())?;
        if let Some(renderer) = &self.renderer {
            config.build.renderer = renderer.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.build.concurrency = concurrency;
        }

        let mapper = PathMapper::new(
            resolve_dir(&base_dir, &self.source)?,
            resolve_dir(&base_dir, &self.output)?,
            config.rules()?,
        )?;
        if !mapper.source_root().is_dir() {
            anyhow::bail!(
                "source directory {} does not exist",
                mapper.source_root().display()
            );
        }

        let source_root = mapper.source_root().to_path_buf();
        let output_root = mapper.output_root().to_path_buf();
        let pipeline = Pipeline::new(
            TokioFs,
            ProcessRenderer::new(&config.build.renderer),
            mapper,
        )
        .with_excludes(config.excludes()?)
        .with_concurrency(config.build.concurrency)?;

        tracing::debug!(
            "source {}, output {}, renderer {}",
            source_root.display(),
            output_root.display(),
            config.build.renderer
        );

        Ok(Project {
            config,
            source_root,
            output_root,
            pipeline,
        })
    }
}
