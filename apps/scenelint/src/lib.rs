//! scenelint core library.
//!
//! This crate lints fiction scenes for prose-style problems and checks them
//! for continuity against a ledger snapshot of the story world (location,
//! time of day, present characters, aliases, time constraints).
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `models`: Rule, policy, ledger and report data models.
//! - `defaults`: Built-in rule catalogue.
//! - `rules`: Rule compilation into a `RuleSet`.
//! - `matcher`: Scoped pattern matching over a scene.
//! - `text`: Paragraph, sentence and dialogue indexing.
//! - `lexicon`: Word lists and derived regexes shared by checks.
//! - `checks`: Style and continuity checks.
//! - `lint`: The lint pass over one text or many files.
//! - `output`: Human/JSON/markdown printers.
//! - `utils`: Supporting helpers.
//!
//! ```
//! use scenelint::{lint, LedgerSnapshot, LintPolicy, RuleSet};
//!
//! let rules = RuleSet::builtin(LintPolicy::default());
//! let ledger = LedgerSnapshot::new("Library", "morning").with_present(["Mira"]);
//! let report = lint("Mira read in the library.", &rules, &ledger).unwrap();
//! assert!(report.is_clean());
//! ```
pub mod checks;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod lexicon;
pub mod lint;
pub mod matcher;
pub mod models;
pub mod output;
pub mod rules;
pub mod text;
pub mod utils;

pub use error::{ConfigError, LintError, RulePatternError};
pub use lint::{lint, lint_bytes, run_lint};
pub use models::ledger::LedgerSnapshot;
pub use models::policy::LintPolicy;
pub use models::rules::Rule;
pub use models::{Category, Diagnostic, LintReport, Severity, TextSpan, Violation};
pub use rules::RuleSet;
