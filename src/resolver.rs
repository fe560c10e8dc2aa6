//! Deterministic file selection from include/ignore glob patterns.

use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ignore patterns applied by convention: third-party dependencies and
/// framework build output.
pub const DEFAULT_IGNORES: &[&str] = &[
    "**/node_modules/**",
    "**/.next/**",
    "**/dist/**",
    "**/out/**",
    "**/build/**",
];

/// Expands include/ignore glob patterns into a deduplicated,
/// lexicographically sorted list of file paths under a root directory.
///
/// Scanning is best-effort and never aborts the run: a nonexistent root or
/// an invalid pattern yields an empty list with a warning. Identical inputs
/// over an unchanged tree always produce the same list.
#[derive(Default, Clone)]
pub struct FileSetResolver {
    includes: Vec<String>,
    ignores: Vec<String>,
}

impl FileSetResolver {
    /// Creates a resolver with no patterns. With no include patterns, no
    /// files match.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include glob pattern (supports `**` recursive segments).
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Adds an ignore glob pattern.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignores.push(pattern.into());
        self
    }

    /// Adds the conventional dependency/build-output ignore set.
    pub fn default_ignores(mut self) -> Self {
        self.ignores
            .extend(DEFAULT_IGNORES.iter().map(|p| p.to_string()));
        self
    }

    /// Resolves the file set for `root`: every file matching at least one
    /// include pattern and no ignore pattern, sorted and deduplicated.
    pub fn resolve(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if self.includes.is_empty() || !root.is_dir() {
            return Ok(Vec::new());
        }

        let include_set = match build_glob_set(&self.includes) {
            Ok(set) => set,
            Err(e) => {
                warn!("invalid include pattern, resolving to empty set: {e}");
                return Ok(Vec::new());
            }
        };
        let ignore_set = match build_glob_set(&self.ignores) {
            Ok(set) => set,
            Err(e) => {
                warn!("invalid ignore pattern, resolving to empty set: {e}");
                return Ok(Vec::new());
            }
        };

        let mut matched = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if !include_set.is_match(rel_path) {
                continue;
            }
            if ignore_set.is_match(rel_path) {
                continue;
            }

            matched.push(path.to_path_buf());
        }

        matched.sort();
        matched.dedup();
        Ok(matched)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
