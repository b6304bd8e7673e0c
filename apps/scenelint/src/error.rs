//! Error taxonomy for the lint engine and its loaders.
//!
//! - `RulePatternError` is recoverable: the offending rule is skipped and the
//!   pass continues with a diagnostic recorded in the report.
//! - `LintError` is fatal to a single lint pass (bad ledger, undecodable text).
//! - `ConfigError` covers reading and parsing rule, ledger and project files.

use std::path::PathBuf;
use thiserror::Error;

/// A rule whose regex does not compile.
#[derive(Debug, Error)]
#[error("rule '{rule_id}' has a malformed pattern: {source}")]
pub struct RulePatternError {
    pub rule_id: String,
    #[source]
    pub source: regex::Error,
}

/// Errors that abort a lint pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LintError {
    #[error("ledger field '{field}' is invalid: {reason}")]
    LedgerShape { field: String, reason: String },

    #[error("input text is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InputEncoding { valid_up_to: usize },
}

impl LintError {
    pub(crate) fn ledger(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LedgerShape {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading rule, ledger or project configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("rule '{id}' declares unknown category '{category}'")]
    UnknownCategory { id: String, category: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
