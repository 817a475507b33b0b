// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! sitemirror configuration.
//!
//! Configuration is loaded from `sitemirror.toml` in the base directory.
//! Every field is optional; command-line flags override file values.
//!
//! # Example Configuration
//!
//! ```toml
//! [build]
//! renderer = "php-cgi"
//! template_ext = "php"
//! output_ext = "html"
//! full_rebuild_exts = ["html"]
//! concurrency = 16
//! exclude = [".git/**", "**/*.swp"]
//!
//! [watch]
//! backend = "recursive"     # recursive | per-directory | poll
//! debounce_ms = 500
//! poll_interval_ms = 1000
//! ```

use anyhow::Context;
use serde::Deserialize;
use sitemirror::{ExcludeSet, ExtensionRules, DEFAULT_CONCURRENCY, DEFAULT_RENDERER};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the base directory.
pub const CONFIG_FILE: &str = "sitemirror.toml";

/// Main configuration structure loaded from `sitemirror.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// Watch mode settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Build settings.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Renderer executable, invoked as `<renderer> -f <file>` (default: "php-cgi").
    #[serde(default = "default_renderer")]
    pub renderer: String,
    /// Extension of files passed to the renderer (default: "php").
    #[serde(default = "default_template_ext")]
    pub template_ext: String,
    /// Extension rendered files are written with (default: "html").
    #[serde(default = "default_output_ext")]
    pub output_ext: String,
    /// Extensions whose changes rebuild everything (default: ["html"]).
    #[serde(default = "default_full_rebuild_exts")]
    pub full_rebuild_exts: Vec<String>,
    /// Files transformed at once during a full rebuild (default: 16).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Glob patterns, relative to the source root, that are never built.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// How the source tree is watched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum WatchBackend {
    /// One native recursive subscription on the source root.
    #[default]
    Recursive,
    /// One native subscription per directory, added as directories appear.
    PerDirectory,
    /// Periodic scanning, for filesystems without change events.
    Poll,
}

/// Watch mode settings.
#[derive(Debug, Deserialize)]
pub struct WatchConfig {
    /// Watch backend (default: "recursive").
    #[serde(default)]
    pub backend: WatchBackend,
    /// Quiet period before a change starts a run (default: 500).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Scan interval of the poll backend (default: 1000).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_renderer() -> String {
    DEFAULT_RENDERER.to_string()
}

fn default_template_ext() -> String {
    "php".to_string()
}

fn default_output_ext() -> String {
    "html".to_string()
}

fn default_full_rebuild_exts() -> Vec<String> {
    vec!["html".to_string()]
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_exclude() -> Vec<String> {
    vec![".git".to_string(), ".git/**".to_string(), "**/*.swp".to_string()]
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            renderer: default_renderer(),
            template_ext: default_template_ext(),
            output_ext: default_output_ext(),
            full_rebuild_exts: default_full_rebuild_exts(),
            concurrency: default_concurrency(),
            exclude: default_exclude(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            backend: WatchBackend::default(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Otherwise `sitemirror.toml` in
    /// `base_dir` is used if present, and defaults if not.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(base_dir: &Path, path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = base_dir.join(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid {}", config_path.display()))
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The extension rules described by `[build]`.
    pub fn rules(&self) -> anyhow::Result<ExtensionRules> {
        Ok(ExtensionRules::new(
            &self.build.template_ext,
            &self.build.output_ext,
            &self.build.full_rebuild_exts,
        )?)
    }

    /// The compiled exclude patterns.
    pub fn excludes(&self) -> anyhow::Result<ExcludeSet> {
        Ok(ExcludeSet::new(&self.build.exclude)?)
    }

    /// The debounce quiet period.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }

    /// The poll backend's scan interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }
}

/// Resolves a directory argument against `base_dir`.
///
/// Only the final component of `arg` is kept, so `./site/`, `site` and
/// `/elsewhere/site` all name `<base_dir>/site`. The argument itself is
/// resolved against the current directory first, which makes `.` name the
/// current directory.
///
/// # Errors
///
/// Returns an error when `arg` has no usable final component (for example `/`).
pub fn resolve_dir(base_dir: &Path, arg: &str) -> anyhow::Result<PathBuf> {
    let arg = Path::new(arg);
    let absolute = if arg.is_absolute() {
        arg.to_path_buf()
    } else {
        std::env::current_dir()?.join(arg)
    };

    let name = normalized_name(&absolute)
        .with_context(|| format!("'{}' does not name a directory", arg.display()))?;
    Ok(base_dir.join(name))
}

/// Final component after lexically resolving `.` and `..`.
fn normalized_name(path: &Path) -> Option<String> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::Normal(part) => parts.push(part),
            std::path::Component::ParentDir => {
                parts.pop();
            }
            _ => {}
        }
    }
    parts
        .last()
        .map(|part| part.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}
