//! Error types for the codemod engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for codemod operations.
#[derive(Error, Debug)]
pub enum CodemodError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("No opening delimiter at offset {offset}")]
    NoDelimiter { offset: usize },

    #[error("Unbalanced delimiter opened at offset {offset}")]
    Unbalanced { offset: usize },

    #[error("Rule '{rule}' failed: {message}")]
    RuleFailed { rule: String, message: String },

    #[error("Write failed for {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for codemod operations.
pub type Result<T> = std::result::Result<T, CodemodError>;
