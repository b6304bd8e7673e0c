//! Lint orchestration.
//!
//! `lint` validates the ledger, indexes the text once, runs the style and
//! continuity checks and folds the findings into an ordered `LintReport`.
//! `run_lint` applies the same pass to many scene files in parallel and
//! returns per-file reports in path order with a summary.

use crate::checks::{self, CheckContext};
use crate::error::LintError;
use crate::models::ledger::LedgerSnapshot;
use crate::models::{FileReport, LintReport, LintResult, Summary};
use crate::rules::RuleSet;
use crate::text::Document;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Lint one scene text against a rule set and ledger snapshot.
///
/// Fails only when the ledger is malformed. Rules that could not be compiled
/// are carried as diagnostics, never as errors.
pub fn lint(text: &str, rules: &RuleSet, ledger: &LedgerSnapshot) -> Result<LintReport, LintError> {
    ledger.validate()?;
    let doc = Document::new(text);
    let ctx = CheckContext::new(&doc, rules, ledger);
    let found = checks::run_all(&ctx);
    let raw = found.len();
    let report = LintReport::from_violations(found, rules.diagnostics().to_vec());
    tracing::debug!(
        bytes = text.len(),
        raw,
        violations = report.violations.len(),
        errors = report.error_count,
        warnings = report.warning_count,
        "lint pass complete"
    );
    Ok(report)
}

/// Like `lint`, for undecoded input.
pub fn lint_bytes(
    bytes: &[u8],
    rules: &RuleSet,
    ledger: &LedgerSnapshot,
) -> Result<LintReport, LintError> {
    let text = std::str::from_utf8(bytes).map_err(|e| LintError::InputEncoding {
        valid_up_to: e.valid_up_to(),
    })?;
    lint(text, rules, ledger)
}

fn lint_file(path: &Path, root: &Path, rules: &RuleSet, ledger: &LedgerSnapshot) -> FileReport {
    let file = crate::utils::display_path(path, root);
    let outcome = fs::read(path)
        .map_err(|e| format!("failed to read: {}", e))
        .and_then(|bytes| lint_bytes(&bytes, rules, ledger).map_err(|e| e.to_string()));
    match outcome {
        Ok(report) => FileReport {
            file,
            report: Some(report),
            error: None,
        },
        Err(error) => {
            tracing::warn!(file = %file, %error, "scene not linted");
            FileReport {
                file,
                report: None,
                error: Some(error),
            }
        }
    }
}

/// Lint every file in `paths` in parallel. Results are sorted by path so
/// output does not depend on scheduling.
pub fn run_lint(
    paths: &[PathBuf],
    root: &Path,
    rules: &RuleSet,
    ledger: &LedgerSnapshot,
) -> LintResult {
    let mut files: Vec<FileReport> = paths
        .par_iter()
        .map(|p| lint_file(p, root, rules, ledger))
        .collect();
    files.sort_by(|a, b| a.file.cmp(&b.file));

    let mut summary = Summary {
        files: files.len(),
        ..Summary::default()
    };
    for f in &files {
        match &f.report {
            Some(r) => {
                summary.errors += r.error_count;
                summary.warnings += r.warning_count;
            }
            None => summary.failed += 1,
        }
    }
    LintResult { files, summary }
}

/// Expand glob patterns (relative to `root`) into a sorted, deduplicated
/// file list. Plain paths pass through unchanged.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, glob::PatternError> {
    let mut out: Vec<PathBuf> = Vec::new();
    for pat in patterns {
        let joined = if Path::new(pat).is_absolute() {
            PathBuf::from(pat)
        } else {
            root.join(pat)
        };
        let pattern = joined.to_string_lossy().to_string();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(p) if p.is_file() => out.push(p),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable glob entry"),
            }
        }
    }
    out.sort();
    out.dedup();
    Ok(out)
}
