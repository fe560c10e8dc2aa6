//! Run reporting: change records, per-file outcomes, and the run summary.
//!
//! Dry-run and write mode compute the identical change set; only the
//! persistence step differs. The report is append-only and merging is
//! commutative, so per-file results can be aggregated in any completion
//! order under parallel execution.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Whether the run previews or persists its changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    DryRun,
    Write,
}

impl Mode {
    /// The per-file verb for report lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Mode::DryRun => "would update",
            Mode::Write => "updated",
        }
    }

    /// The verb phrase for the summary line.
    pub fn summary_verb(&self) -> &'static str {
        match self {
            Mode::DryRun => "Would update",
            Mode::Write => "Updated",
        }
    }
}

/// A file whose transformed content differs from its original content.
/// Emitted only when `after != before`, byte-exact.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub path: PathBuf,
    #[serde(skip)]
    pub before: String,
    #[serde(skip)]
    pub after: String,
    /// Ids of the rules that changed the file, in application order.
    pub rules_applied: Vec<String>,
}

/// A file-scoped failure; the run continues with the remaining files.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Terminal state of one scanned file.
///
/// `Scanned -> {Unchanged, Errored, Changed}`; a `Changed` file is then
/// persisted (write mode) or reported (dry-run mode) by the runner.
#[derive(Debug)]
pub enum FileOutcome {
    Unchanged(PathBuf),
    Changed(ChangeRecord),
    Errored(FileFailure),
}

/// The outcome of one engine run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    pub changed: Vec<ChangeRecord>,
    pub errored: Vec<FileFailure>,
    pub total_scanned: usize,
}

impl RunReport {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            changed: Vec::new(),
            errored: Vec::new(),
            total_scanned: 0,
        }
    }

    /// Folds one file's outcome into the report.
    pub fn record(&mut self, outcome: FileOutcome) {
        self.total_scanned += 1;
        match outcome {
            FileOutcome::Unchanged(_) => {}
            FileOutcome::Changed(record) => self.changed.push(record),
            FileOutcome::Errored(failure) => self.errored.push(failure),
        }
    }

    /// Merges another report of the same mode. Commutative up to the final
    /// sort, so partial reports can be combined in any order.
    pub fn merge(&mut self, other: RunReport) {
        self.total_scanned += other.total_scanned;
        self.changed.extend(other.changed);
        self.errored.extend(other.errored);
        self.sort();
    }

    /// Orders entries by path for deterministic output.
    pub fn sort(&mut self) {
        self.changed.sort_by(|a, b| a.path.cmp(&b.path));
        self.errored.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Line-oriented report: one `<verb> <relative-path>` line per changed
    /// file, then the summary.
    pub fn render(&self, root: &Path) -> String {
        let mut out = String::new();
        for record in &self.changed {
            let rel = record.path.strip_prefix(root).unwrap_or(&record.path);
            out.push_str(&format!("{} {}\n", self.mode.verb(), rel.display()));
        }
        out.push_str(&self.summary());
        out
    }

    /// The closing summary line(s).
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Done. {} {} file(s).\n",
            self.mode.summary_verb(),
            self.changed.len()
        );
        if !self.errored.is_empty() {
            out.push_str(&format!("{} file(s) errored.\n", self.errored.len()));
        }
        out
    }

    /// Serializes the report (paths, rule ids, counts; not file bodies).
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
