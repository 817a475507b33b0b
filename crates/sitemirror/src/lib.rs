// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # sitemirror
//!
//! Incremental mirror builds for template-driven sites.
//!
//! A source tree is mirrored into an output tree. Template files (`.php` by
//! default) are rendered by an external program and written with the output
//! extension; every other file is copied with `.php` references in its
//! content rewritten to `.html`.
//!
//! ## Features
//!
//! - Full rebuilds with bounded concurrent fan-out
//! - Single-path rebuilds for edits, new directories and deletions
//! - A run coordinator that debounces bursts and coalesces changes that
//!   arrive mid-run into one follow-up run
//! - Pluggable filesystem and renderer adapters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sitemirror::{Coordinator, ExtensionRules, PathMapper, Pipeline, ProcessRenderer, TokioFs};
//! use std::sync::Arc;
//!
//! let mapper = PathMapper::new("./site", "./public", ExtensionRules::default())?;
//! let pipeline = Arc::new(Pipeline::new(TokioFs, ProcessRenderer::default(), mapper));
//!
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! Coordinator::new(pipeline).run(rx).await;
//! ```

/// Run coordination: state machine, debounce timer and driver.
pub mod coordinator;
/// Error types.
pub mod error;
/// Glob-based path exclusion.
pub mod exclude;
/// Async filesystem adapter.
pub mod fs;
/// Source to output path mapping.
pub mod mapping;
/// Full and single-path rebuilds.
pub mod pipeline;
/// External renderer invocation.
pub mod render;
/// File-kind classification and extension rewriting.
pub mod rules;
/// Per-file transformation.
pub mod transform;
/// Breadth-first source tree traversal.
pub mod walker;

pub use coordinator::{
    ChangeNotification, Coordinator, Debounce, NotificationDecision, RunOutcome, RunState,
    Scheduler, DEFAULT_DEBOUNCE,
};
pub use error::{BuildError, Result};
pub use exclude::ExcludeSet;
pub use fs::{BuildFs, EntryKind, TokioFs};
pub use mapping::{FileTask, PathMapper};
pub use pipeline::{BuildPipeline, Pipeline, RunKind, RunSummary, DEFAULT_CONCURRENCY};
pub use render::{ProcessRenderer, Renderer, DEFAULT_RENDERER};
pub use rules::{ExtensionRules, FileKind, TriggerKind};
pub use transform::{TransformEngine, TransformMode};
pub use walker::{TreeWalker, Walk};
