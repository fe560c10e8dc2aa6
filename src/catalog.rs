//! Pre-built, named rule pipelines for the application source tree.
//!
//! Each pipeline is an ordered list: where one rule's output enables the
//! next rule's match, that dependency is expressed here rather than left to
//! whatever order separate scripts happen to run in.

use crate::error::{CodemodError, Result};
use crate::rules::{RemoveImportRule, Rule, StripAssignmentRule};
use crate::structural::{TagRewrite, UnwrapTag};

/// Names of all built-in pipelines.
pub const PIPELINES: &[&str] = &["legacy-layout", "chart-props"];

/// Looks up a built-in pipeline by name.
pub fn pipeline(name: &str) -> Result<Vec<Box<dyn Rule>>> {
    match name {
        "legacy-layout" => legacy_layout_cleanup(),
        "chart-props" => chart_prop_rewrite(),
        other => Err(CodemodError::InvalidConfig(format!(
            "unknown pipeline '{other}' (available: {})",
            PIPELINES.join(", ")
        ))),
    }
}

/// Removes the legacy per-page layout wiring.
///
/// Order matters: the assignment and wrapper rules remove the last uses of
/// `Layout`, which is what lets the import rule fire at all.
pub fn legacy_layout_cleanup() -> Result<Vec<Box<dyn Rule>>> {
    Ok(vec![
        Box::new(StripAssignmentRule::new(
            "remove-get-layout",
            r"(?m)^[ \t]*[A-Za-z_$][\w$]*\.getLayout\s*=",
        )?),
        Box::new(UnwrapTag::new("unwrap-layout", "Layout")),
        Box::new(RemoveImportRule::new("drop-layout-import", "Layout")?),
    ])
}

/// Migrates chart widget props to their current names: `data` becomes
/// `series`, `subtitle` folds into `description`, and the long-dead
/// `legacy` flag is dropped.
pub fn chart_prop_rewrite() -> Result<Vec<Box<dyn Rule>>> {
    Ok(vec![Box::new(
        TagRewrite::new("chart-card-props", "ChartCard")
            .rename_attr("data", "series")
            .fold_attr("subtitle", "description")
            .remove_attr("legacy"),
    )])
}
