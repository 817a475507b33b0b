// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Console status lines for completed runs.

use console::style;
use sitemirror::{Result, RunKind, RunSummary};
use std::path::{Path, PathBuf};

/// Prints one status line per run and one error line per failed file.
#[derive(Debug, Clone)]
pub struct Reporter {
    source_root: PathBuf,
    quiet: bool,
}

impl Reporter {
    /// Creates a reporter. In quiet mode only failures are printed.
    pub fn new(source_root: impl Into<PathBuf>, quiet: bool) -> Self {
        Self {
            source_root: source_root.into(),
            quiet,
        }
    }

    /// Prints the outcome of a run.
    pub fn report(&self, kind: &RunKind, result: &Result<RunSummary>) {
        let (status, errors) = self.lines(kind, result);
        match status {
            Status::Ok(line) if !self.quiet => println!("{}", line),
            Status::Ok(_) => {}
            Status::Failed(line) => eprintln!("{}", line),
        }
        for line in errors {
            eprintln!("{}", line);
        }
    }

    fn lines(&self, kind: &RunKind, result: &Result<RunSummary>) -> (Status, Vec<String>) {
        let label = self.label(kind);
        match result {
            Ok(summary) if summary.is_success() => (
                Status::Ok(format!(
                    "  {} {:<24} {}",
                    style("✓").green(),
                    style(&label).dim(),
                    style(format!(
                        "{} file(s) {}ms",
                        summary.files,
                        summary.elapsed.as_millis()
                    ))
                    .dim()
                )),
                Vec::new(),
            ),
            Ok(summary) => {
                let status = Status::Failed(format!(
                    "  {} {:<24} {}",
                    style("✗").red(),
                    style(&label).dim(),
                    style(format!(
                        "{} of {} file(s) failed",
                        summary.failures.len(),
                        summary.files
                    ))
                    .red()
                ));
                let errors = summary
                    .failures
                    .iter()
                    .map(|(path, err)| {
                        format!(
                            "    {} {}",
                            style(self.relative(path).display()).cyan(),
                            style(err).red()
                        )
                    })
                    .collect();
                (status, errors)
            }
            Err(err) => (
                Status::Failed(format!(
                    "  {} {:<24} {}",
                    style("✗").red(),
                    style(&label).dim(),
                    style(err).red()
                )),
                Vec::new(),
            ),
        }
    }

    fn label(&self, kind: &RunKind) -> String {
        match kind {
            RunKind::Full => "Full rebuild".to_string(),
            RunKind::Single(path) => self.relative(path).display().to_string(),
        }
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.source_root).unwrap_or(path)
    }
}

enum Status {
    Ok(String),
    Failed(String),
}
