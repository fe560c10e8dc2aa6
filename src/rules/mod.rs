//! Transformation rules and the engine that applies them.

pub mod text;

pub use text::{ClosureRule, PatternRule, RemoveImportRule, StripAssignmentRule};

use crate::error::Result;
use log::debug;
use std::path::Path;

/// A single idempotent source transformation.
///
/// Rules are pure functions over text: `apply` must not touch the filesystem,
/// and applying a rule to its own output must be a no-op
/// (`apply(apply(t)) == apply(t)`). The engine relies on that contract to
/// converge instead of oscillating when the same pipeline is run twice.
pub trait Rule: Send + Sync {
    /// Stable identifier, recorded in change reports.
    fn id(&self) -> &str;

    /// Cheap pre-check: does the rule have anything left to do on `source`?
    /// Used to drive the per-rule fixpoint loop.
    fn matches(&self, source: &str) -> bool;

    /// Produces the transformed text. Must not mutate files. An error here is
    /// a hard, file-scoped failure: the whole file is skipped and reported as
    /// errored rather than partially transformed.
    fn apply(&self, source: &str, path: &Path) -> Result<String>;

    /// Human-readable description of the rule.
    fn describe(&self) -> String {
        self.id().to_string()
    }
}

/// Applies an ordered list of rules to one file's text.
///
/// Ordering is semantically significant: a rule that strips a wrapper tag
/// must run before the rule that deletes the now-unused import of that tag.
/// Each rule runs its own fixpoint exactly once per pass; there is no
/// cross-rule global fixpoint.
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the pipeline.
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Appends pre-boxed rules, preserving their order.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Box<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Returns the number of rules in the pipeline.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs the pipeline over `source`, returning the transformed text and
    /// the ids of the rules that changed it, in application order.
    ///
    /// Within one rule the transform is re-applied to fixpoint, so a rule
    /// that removes one occurrence per application still clears a file with
    /// many occurrences. The iteration count is bounded by the input length
    /// to guarantee termination even for a rule that violates its
    /// idempotence contract.
    pub fn apply_file(&self, source: &str, path: &Path) -> Result<(String, Vec<String>)> {
        let mut current = source.to_string();
        let mut applied = Vec::new();

        for rule in &self.rules {
            let mut changed = false;
            let max_iterations = source.len().max(1);

            for _ in 0..max_iterations {
                if !rule.matches(&current) {
                    break;
                }
                let next = rule.apply(&current, path)?;
                if next == current {
                    break;
                }
                debug!("{}: applied '{}'", path.display(), rule.id());
                current = next;
                changed = true;
            }

            if changed {
                applied.push(rule.id().to_string());
            }
        }

        Ok((current, applied))
    }
}
