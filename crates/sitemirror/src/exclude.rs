// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Glob-based exclusion of source paths.

use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// A compiled set of exclude patterns, matched against paths relative to the source root.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    set: GlobSet,
    empty: bool,
}

impl ExcludeSet {
    /// Compiles the given glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            set: builder.build()?,
            empty: patterns.is_empty(),
        })
    }

    /// An exclude set that matches nothing.
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            empty: true,
        }
    }

    /// True when `path` (under `root`) matches one of the patterns.
    ///
    /// Paths outside `root` are never excluded.
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        if self.empty {
            return false;
        }
        match path.strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => self.set.is_match(rel),
            _ => false,
        }
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::empty()
    }
}
