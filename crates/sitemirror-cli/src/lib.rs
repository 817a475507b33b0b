// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! sitemirror CLI library.
//!
//! This crate provides the command-line interface for sitemirror: it reads
//! configuration, watches the source tree and feeds changes to the run
//! coordinator from the `sitemirror` crate.
//!
//! # Usage
//!
//! This crate is primarily used through the `sitemirror` binary:
//!
//! ```bash
//! sitemirror run site public     # Build, then rebuild on every change
//! sitemirror build site public   # Build once
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `sitemirror.toml` in the base directory.

/// CLI commands (run, build).
pub mod commands;
/// Project configuration from `sitemirror.toml`.
pub mod config;
/// Console status output.
pub mod report;
/// File system watching for watch mode.
pub mod watcher;
