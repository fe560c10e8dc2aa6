//! The codemod runner: resolve files, transform each one, persist or report.

use crate::error::{CodemodError, Result};
use crate::report::{ChangeRecord, FileFailure, FileOutcome, Mode, RunReport};
use crate::resolver::FileSetResolver;
use crate::rules::{Rule, RuleEngine};
use log::warn;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// A configured codemod run over one source tree.
///
/// Files are read once, passed through the rule pipeline in memory, and
/// written at most once. Distinct files are independent and transformed in
/// parallel; the per-file rule sequence itself is strictly ordered, and
/// writes are performed one at a time during aggregation so no two writers
/// ever overlap.
pub struct Codemod {
    root: PathBuf,
    resolver: FileSetResolver,
    engine: RuleEngine,
    mode: Mode,
}

impl Codemod {
    /// Creates a dry-run codemod rooted at the given directory.
    pub fn in_tree(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resolver: FileSetResolver::new(),
            engine: RuleEngine::new(),
            mode: Mode::DryRun,
        }
    }

    /// Adds an include glob pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.resolver = self.resolver.include(pattern);
        self
    }

    /// Adds an ignore glob pattern.
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.resolver = self.resolver.ignore(pattern);
        self
    }

    /// Adds the conventional dependency/build-output ignore set.
    pub fn default_ignores(mut self) -> Self {
        self.resolver = self.resolver.default_ignores();
        self
    }

    /// Appends a rule to the pipeline. Order is significant.
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.engine = self.engine.rule(rule);
        self
    }

    /// Appends pre-boxed rules, preserving their order.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Box<dyn Rule>>) -> Self {
        self.engine = self.engine.rules(rules);
        self
    }

    /// Switches the run to write mode. The default is dry-run.
    pub fn write(mut self) -> Self {
        self.mode = Mode::Write;
        self
    }

    /// Sets the mode explicitly.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Executes the run.
    ///
    /// Both modes compute the identical change set; write mode additionally
    /// persists each record's `after` text. Every failure is file-scoped:
    /// the run always completes and reports changed and errored counts.
    pub fn run(&self) -> Result<RunReport> {
        let files = self.resolver.resolve(&self.root)?;

        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|path| self.process_file(path))
            .collect();

        let mut report = RunReport::new(self.mode);
        for outcome in outcomes {
            report.record(self.persist(outcome));
        }
        report.sort();
        Ok(report)
    }

    /// Reads one file and runs the pipeline over it. Never touches disk.
    fn process_file(&self, path: &Path) -> FileOutcome {
        let before = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("{}: read failed: {e}", path.display());
                return FileOutcome::Errored(FileFailure {
                    path: path.to_path_buf(),
                    message: format!("read failed: {e}"),
                });
            }
        };

        match self.engine.apply_file(&before, path) {
            Ok((after, rules_applied)) => {
                if after == before {
                    FileOutcome::Unchanged(path.to_path_buf())
                } else {
                    FileOutcome::Changed(ChangeRecord {
                        path: path.to_path_buf(),
                        before,
                        after,
                        rules_applied,
                    })
                }
            }
            Err(e) => {
                warn!("{}: skipped: {e}", path.display());
                FileOutcome::Errored(FileFailure {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// In write mode, persists a changed file. A failed write demotes the
    /// outcome to errored; the run continues.
    fn persist(&self, outcome: FileOutcome) -> FileOutcome {
        let FileOutcome::Changed(record) = outcome else {
            return outcome;
        };
        if self.mode == Mode::DryRun {
            return FileOutcome::Changed(record);
        }
        match fs::write(&record.path, &record.after) {
            Ok(()) => FileOutcome::Changed(record),
            Err(e) => {
                let err = CodemodError::WriteFailed {
                    path: record.path.clone(),
                    source: e,
                };
                warn!("{err}");
                FileOutcome::Errored(FileFailure {
                    path: record.path,
                    message: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ClosureRule, PatternRule};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    fn rename_rule() -> PatternRule {
        PatternRule::new("old-to-new", r"\bOldWidget\b", "NewWidget").unwrap()
    }

    fn seed(dir: &Path) {
        write_file(dir, "app/a.tsx", "export const A = <OldWidget />;\n");
        write_file(dir, "app/b.tsx", "export const B = null;\n");
        write_file(dir, "node_modules/p/c.tsx", "export const C = <OldWidget />;\n");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());

        let report = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .default_ignores()
            .rule(rename_rule())
            .run()
            .unwrap();

        assert_eq!(report.mode, Mode::DryRun);
        assert_eq!(report.total_scanned, 2);
        assert_eq!(report.changed.len(), 1);
        assert!(report.changed[0].path.ends_with("app/a.tsx"));

        let on_disk = fs::read_to_string(dir.path().join("app/a.tsx")).unwrap();
        assert!(on_disk.contains("OldWidget"));
    }

    #[test]
    fn dry_run_predicts_write_run_exactly() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());

        let dry = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .default_ignores()
            .rule(rename_rule())
            .run()
            .unwrap();

        let wet = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .default_ignores()
            .rule(rename_rule())
            .write()
            .run()
            .unwrap();

        let dry_paths: Vec<_> = dry.changed.iter().map(|c| c.path.clone()).collect();
        let wet_paths: Vec<_> = wet.changed.iter().map(|c| c.path.clone()).collect();
        assert_eq!(dry_paths, wet_paths);

        let on_disk = fs::read_to_string(dir.path().join("app/a.tsx")).unwrap();
        assert_eq!(on_disk, wet.changed[0].after);
        assert!(on_disk.contains("NewWidget"));
    }

    #[test]
    fn rerun_after_write_changes_nothing() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());

        let build = || {
            Codemod::in_tree(dir.path())
                .include("**/*.tsx")
                .default_ignores()
                .rule(rename_rule())
                .write()
        };
        build().run().unwrap();
        let second = build().run().unwrap();
        assert!(second.changed.is_empty());
    }

    #[test]
    fn failing_file_does_not_abort_run() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "bad.tsx", "POISON\n<OldWidget />\n");
        write_file(dir.path(), "good.tsx", "<OldWidget />\n");

        let report = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .rule(ClosureRule::new(
                "poison-check",
                |s| s.contains("POISON"),
                |_| {
                    Err(CodemodError::RuleFailed {
                        rule: "poison-check".into(),
                        message: "refusing".into(),
                    })
                },
            ))
            .rule(rename_rule())
            .run()
            .unwrap();

        assert_eq!(report.changed.len(), 1);
        assert!(report.changed[0].path.ends_with("good.tsx"));
        assert_eq!(report.errored.len(), 1);
        assert!(report.errored[0].path.ends_with("bad.tsx"));
        assert_eq!(report.total_scanned, 2);
    }

    #[test]
    fn failed_write_is_errored_and_run_continues() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "blocked.tsx", "BLOCKED\n<OldWidget />\n");
        write_file(dir.path(), "good.tsx", "<OldWidget />\n");

        // Swaps the blocked file for a directory while the pipeline runs,
        // so the later write hits a real filesystem error.
        let blocked = dir.path().join("blocked.tsx");
        let report = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .rule(ClosureRule::new(
                "swap-target",
                |s| s.contains("BLOCKED"),
                move |s| {
                    let _ = fs::remove_file(&blocked);
                    let _ = fs::create_dir(&blocked);
                    Ok(s.replace("BLOCKED\n", ""))
                },
            ))
            .rule(rename_rule())
            .write()
            .run()
            .unwrap();

        assert_eq!(report.changed.len(), 1);
        assert!(report.changed[0].path.ends_with("good.tsx"));
        assert_eq!(report.errored.len(), 1);
        assert!(report.errored[0].path.ends_with("blocked.tsx"));
        assert!(report.errored[0].message.contains("Write failed"));
        assert_eq!(report.total_scanned, 2);

        let on_disk = fs::read_to_string(dir.path().join("good.tsx")).unwrap();
        assert!(on_disk.contains("NewWidget"));
    }

    #[test]
    fn reports_are_deterministic_across_runs() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        write_file(dir.path(), "app/z.tsx", "export const Z = <OldWidget />;\n");

        let build = || {
            Codemod::in_tree(dir.path())
                .include("**/*.tsx")
                .default_ignores()
                .rule(rename_rule())
        };
        let first = build().run().unwrap();
        let second = build().run().unwrap();

        assert_eq!(
            first.render(dir.path()),
            second.render(dir.path())
        );
    }

    #[test]
    fn empty_tree_reports_zero() {
        let dir = TempDir::new().unwrap();
        let report = Codemod::in_tree(dir.path())
            .include("**/*.tsx")
            .rule(rename_rule())
            .run()
            .unwrap();
        assert_eq!(report.total_scanned, 0);
        assert!(report.changed.is_empty());
        assert_eq!(report.summary(), "Done. Would update 0 file(s).\n");
    }
}
