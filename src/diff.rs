//! Diff generation for previewing changes.

use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// Generates a unified diff between two versions of one file, with hunk
/// headers and three lines of context.
pub fn unified_diff(original: &str, modified: &str, path: &Path) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(
            &format!("a/{}", path.display()),
            &format!("b/{}", path.display()),
        )
        .to_string()
}

/// Insertion/deletion counts for one before/after pair.
#[derive(Debug, Default)]
pub struct DiffSummary {
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and modified content.
    pub fn from_diff(original: &str, modified: &str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        let mut insertions = 0;
        let mut deletions = 0;

        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        Self {
            insertions,
            deletions,
        }
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} insertions(+), {} deletions(-)",
            self.insertions, self.deletions
        )
    }
}
