//! # tsx-codemod
//!
//! A batch source-rewriting engine for a TypeScript/TSX application tree:
//! idempotent, rule-based transformations applied across many files, with
//! dry-run preview, deterministic file selection, and safe handling of
//! nested code blocks that flat text search cannot delete.
//!
//! The engine is built from five pieces:
//!
//! - [`resolver::FileSetResolver`] expands include/ignore globs into a
//!   sorted, deduplicated file list
//! - [`balance`] finds the exact span of a balanced expression, aware of
//!   string/template literals and comments
//! - [`rules::RuleEngine`] applies an ordered rule pipeline with per-rule
//!   fixpoint semantics
//! - [`structural`] holds AST-backed rules for JSX tags and attributes,
//!   used where text matching is unsafe
//! - [`runner::Codemod`] ties them together and either writes results or
//!   accumulates a dry-run report that exactly predicts a write run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsx_codemod::prelude::*;
//!
//! let report = Codemod::in_tree("./app")
//!     .include("**/*.tsx")
//!     .default_ignores()
//!     .rule(PatternRule::new("old-widget", r"\bOldWidget\b", "NewWidget")?)
//!     .run()?;
//!
//! print!("{}", report.render(std::path::Path::new("./app")));
//! # Ok::<(), tsx_codemod::error::CodemodError>(())
//! ```
//!
//! Running the same pipeline twice converges: every rule is idempotent, so
//! correctness across repeated runs needs no "already applied" marker.

pub mod balance;
pub mod catalog;
pub mod diff;
pub mod error;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod runner;
pub mod structural;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::balance::{DelimiterSpan, extract_balanced, statement_end};
    pub use crate::catalog;
    pub use crate::diff::{DiffSummary, unified_diff};
    pub use crate::error::{CodemodError, Result};
    pub use crate::report::{ChangeRecord, FileFailure, FileOutcome, Mode, RunReport};
    pub use crate::resolver::{DEFAULT_IGNORES, FileSetResolver};
    pub use crate::rules::{
        ClosureRule, PatternRule, RemoveImportRule, Rule, RuleEngine, StripAssignmentRule,
    };
    pub use crate::runner::Codemod;
    pub use crate::structural::{TagRewrite, UnwrapTag};
}

pub use prelude::*;
