//! Output rendering for lint results.
//!
//! Supports `human` (default), `json`, `markdown` and `notes` outputs. The JSON form
//! is the serialized `LintResult`: per-file reports plus a top-level summary.
//! `render_revision_notes` produces the compact per-scene notes fed back
//! into a revision pass.

use crate::models::{Category, LintReport, LintResult, Severity, Violation};
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

fn use_colors(output: &str) -> bool {
    output == "human" && crate::utils::colors_enabled()
}

/// Print lint results in the requested format.
pub fn print_lint(res: &LintResult, output: &str) {
    match output {
        "json" => println!("{}", render_json(res)),
        "markdown" | "md" => print!("{}", render_markdown(res)),
        "notes" => {
            for f in &res.files {
                if let Some(report) = &f.report {
                    println!("<!-- {} -->", f.file);
                    print!("{}", render_revision_notes(report));
                }
            }
        }
        _ => print!("{}", render_human(res, use_colors(output))),
    }
}

/// Compose lint JSON object (pure) for testing/snapshot purposes.
pub fn compose_lint_json(res: &LintResult) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

pub fn render_json(res: &LintResult) -> String {
    serde_json::to_string_pretty(&compose_lint_json(res)).unwrap_or_default()
}

fn marker(sev: Severity, color: bool) -> (String, String) {
    match (sev, color) {
        (Severity::Error, true) => ("✖".red().to_string(), "⟦error⟧".red().bold().to_string()),
        (Severity::Error, false) => ("✖".to_string(), "⟦error⟧".to_string()),
        (Severity::Warning, true) => (
            "▲".yellow().to_string(),
            "⟦warn⟧".yellow().bold().to_string(),
        ),
        (Severity::Warning, false) => ("▲".to_string(), "⟦warn⟧".to_string()),
    }
}

fn bold(s: &str, color: bool) -> String {
    if color {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Text quoted under a finding: the surrounding line when known, else the match.
fn quoted(v: &Violation) -> Option<&str> {
    [v.context.as_str(), v.evidence.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
}

/// One report as human-readable text, grouped under category headers.
pub fn render_report_human(report: &LintReport, color: bool) -> String {
    let mut out = String::new();
    for d in &report.diagnostics {
        let tag = if color {
            "⟦rule⟧".blue().bold().to_string()
        } else {
            "⟦rule⟧".to_string()
        };
        let _ = writeln!(out, "  ◆ {} ❲{}❳ — {}", tag, d.rule_id, d.message);
    }
    for (category, violations) in report.by_category() {
        let _ = writeln!(out, "  {}", bold(&format!("── {} ──", category.title()), color));
        for v in violations {
            let (icon, sev) = marker(v.severity, color);
            let _ = writeln!(
                out,
                "  {} {} L{} ❲{}❳ — {}",
                icon,
                sev,
                v.line(),
                v.rule_id,
                v.message
            );
            if let Some(line) = quoted(v) {
                let _ = writeln!(out, "      > {}", line);
            }
        }
    }
    out
}

pub fn render_human(res: &LintResult, color: bool) -> String {
    let mut out = String::new();
    for f in &res.files {
        let _ = writeln!(out, "{}", bold(&f.file, color));
        if let Some(err) = &f.error {
            let _ = writeln!(out, "  {} {}", crate::utils::error_prefix(), err);
            continue;
        }
        match &f.report {
            Some(r) if r.is_clean() && r.diagnostics.is_empty() => {
                let _ = writeln!(out, "  ✓ clean");
            }
            Some(r) => out.push_str(&render_report_human(r, color)),
            None => {}
        }
    }
    let summary = format!(
        "— Summary — errors={} warnings={} files={} failed={}",
        res.summary.errors, res.summary.warnings, res.summary.files, res.summary.failed
    );
    let _ = writeln!(out, "{}", bold(&summary, color));
    out
}

fn markdown_item(out: &mut String, v: &Violation) {
    let sev = match v.severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
    };
    let _ = writeln!(
        out,
        "- **{}** (line {}) `{}`: {}",
        sev,
        v.line(),
        v.rule_id,
        v.message
    );
    if let Some(line) = quoted(v) {
        let _ = writeln!(out, "  > {}", line);
    }
}

pub fn render_markdown(res: &LintResult) -> String {
    let mut out = String::from("# Lint Report\n\n");
    for f in &res.files {
        let _ = writeln!(out, "## {}\n", f.file);
        if let Some(err) = &f.error {
            let _ = writeln!(out, "Not linted: {}\n", err);
            continue;
        }
        let Some(report) = &f.report else {
            continue;
        };
        if report.is_clean() {
            out.push_str("No violations.\n\n");
        }
        for (category, violations) in report.by_category() {
            let _ = writeln!(out, "### {}\n", category.title());
            for v in violations {
                markdown_item(&mut out, v);
            }
            out.push('\n');
        }
        if !report.diagnostics.is_empty() {
            out.push_str("### Skipped rules\n\n");
            for d in &report.diagnostics {
                let _ = writeln!(out, "- `{}`: {}", d.rule_id, d.message);
            }
            out.push('\n');
        }
    }
    let _ = writeln!(
        out,
        "**Summary**: {} errors, {} warnings across {} files",
        res.summary.errors, res.summary.warnings, res.summary.files
    );
    out
}

/// Compact style and continuity notes for one scene, one bullet per finding.
pub fn render_revision_notes(report: &LintReport) -> String {
    let (continuity, style): (Vec<&Violation>, Vec<&Violation>) = report
        .violations
        .iter()
        .partition(|v| v.category.is_continuity());
    let mut out = String::from("# Style Lint Report\n\n");
    if style.is_empty() {
        out.push_str("No style violations.\n");
    }
    for v in style {
        let _ = writeln!(out, "- **Line {}**: {}", v.line(), v.message);
        if let Some(line) = quoted(v) {
            let _ = writeln!(out, "  > {}", line);
        }
    }
    out.push_str("\n# Continuity Lint Report\n\n");
    if continuity.is_empty() {
        out.push_str("No continuity violations.\n");
    }
    for v in continuity {
        let _ = writeln!(out, "- {}", v.message);
        if let Some(line) = quoted(v) {
            let _ = writeln!(out, "  > {}", line);
        }
    }
    out
}

/// Table of rules for `scenelint rules`.
pub fn render_rule_list(rules: &[&crate::models::rules::Rule], color: bool) -> String {
    let mut out = String::new();
    let mut current: Option<Category> = None;
    for r in rules {
        if current != Some(r.category) {
            current = Some(r.category);
            let _ = writeln!(out, "{}", bold(&format!("── {} ──", r.category.title()), color));
        }
        let (icon, _) = marker(r.severity, color);
        let _ = writeln!(out, "  {} {:<48} {}", icon, r.id, r.severity);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileReport, Summary, TextSpan};
    use pretty_assertions::assert_eq;

    fn violation(rule: &str, category: Category, severity: Severity, line: usize) -> Violation {
        Violation {
            rule_id: rule.into(),
            category,
            severity,
            message: format!("{} fired", rule),
            spans: vec![TextSpan {
                start: line * 10,
                end: line * 10 + 4,
                line,
            }],
            evidence: "text".into(),
            context: String::new(),
        }
    }

    fn result() -> LintResult {
        let report = LintReport::from_violations(
            vec![
                violation("banned_phrases.banned.0", Category::BannedPhrases, Severity::Error, 2),
                violation(
                    "timeline_consistency.time_of_day",
                    Category::TimelineConsistency,
                    Severity::Error,
                    4,
                ),
            ],
            vec![],
        );
        LintResult {
            files: vec![FileReport {
                file: "scenes/01.md".into(),
                report: Some(report),
                error: None,
            }],
            summary: Summary {
                errors: 2,
                warnings: 0,
                files: 1,
                failed: 0,
            },
        }
    }

    #[test]
    fn test_compose_lint_json_shape() {
        let out = compose_lint_json(&result());
        assert_eq!(out["summary"]["errors"], 2);
        assert_eq!(out["files"][0]["file"], "scenes/01.md");
        let v = &out["files"][0]["report"]["violations"][0];
        assert_eq!(v["category"], "banned_phrases");
        assert_eq!(v["severity"], "error");
        assert_eq!(v["spans"][0]["line"], 2);
        assert!(out["files"][0]["report"].get("diagnostics").is_none());
    }

    #[test]
    fn test_human_output_without_color() {
        let text = render_human(&result(), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "scenes/01.md");
        assert_eq!(lines[1], "  ── Banned phrases ──");
        assert_eq!(
            lines[2],
            "  ✖ ⟦error⟧ L2 ❲banned_phrases.banned.0❳ — banned_phrases.banned.0 fired"
        );
        assert_eq!(lines[3], "      > text");
        assert!(text.ends_with("— Summary — errors=2 warnings=0 files=1 failed=0\n"));
    }

    #[test]
    fn test_revision_notes_split_style_and_continuity() {
        let res = result();
        let notes = render_revision_notes(res.files[0].report.as_ref().unwrap());
        assert_eq!(
            notes,
            "# Style Lint Report\n\n- **Line 2**: banned_phrases.banned.0 fired\n  > text\n\n# Continuity Lint Report\n\n- timeline_consistency.time_of_day fired\n  > text\n"
        );
        let clean = render_revision_notes(&LintReport::default());
        assert!(clean.contains("No style violations."));
        assert!(clean.contains("No continuity violations."));
    }

    #[test]
    fn test_context_line_is_quoted_instead_of_evidence() {
        let mut v = violation("meta_narrative.reader", Category::MetaNarrative, Severity::Error, 3);
        v.context = "Dear reader, the lamp went out.".into();
        let report = LintReport::from_violations(vec![v], vec![]);
        let human = render_report_human(&report, false);
        assert!(human.contains("      > Dear reader, the lamp went out.\n"));
        assert!(!human.contains("> text"));
        let notes = render_revision_notes(&report);
        assert!(notes.contains("  > Dear reader, the lamp went out.\n"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["violations"][0]["context"], "Dear reader, the lamp went out.");
    }

    #[test]
    fn test_markdown_groups_by_category() {
        let md = render_markdown(&result());
        assert!(md.starts_with("# Lint Report\n\n## scenes/01.md\n\n### Banned phrases\n\n"));
        assert!(md.contains("- **Error** (line 4) `timeline_consistency.time_of_day`"));
        assert!(md.contains("**Summary**: 2 errors, 0 warnings across 1 files"));
    }
}
