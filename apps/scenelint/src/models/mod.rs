//! Shared data models for lint output plus the rule, policy and ledger schemas.

pub mod ledger;
pub mod policy;
pub mod rulefile;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Violation severity. Hard rules raise errors, soft preferences warnings.
///
/// The derived order places `Error` before `Warning`.
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Fixed violation taxonomy: eight style categories followed by three
/// continuity categories. Declaration order is report order.
pub enum Category {
    BannedPhrases,
    SceneContainment,
    MetaNarrative,
    PovAddress,
    Editorializing,
    ObjectAnthropomorphism,
    DialogueExposition,
    PovConsistency,
    LocationMentions,
    CharacterPresence,
    TimelineConsistency,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::BannedPhrases,
        Category::SceneContainment,
        Category::MetaNarrative,
        Category::PovAddress,
        Category::Editorializing,
        Category::ObjectAnthropomorphism,
        Category::DialogueExposition,
        Category::PovConsistency,
        Category::LocationMentions,
        Category::CharacterPresence,
        Category::TimelineConsistency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::BannedPhrases => "banned_phrases",
            Category::SceneContainment => "scene_containment",
            Category::MetaNarrative => "meta_narrative",
            Category::PovAddress => "pov_address",
            Category::Editorializing => "editorializing",
            Category::ObjectAnthropomorphism => "object_anthropomorphism",
            Category::DialogueExposition => "dialogue_exposition",
            Category::PovConsistency => "pov_consistency",
            Category::LocationMentions => "location_mentions",
            Category::CharacterPresence => "character_presence",
            Category::TimelineConsistency => "timeline_consistency",
        }
    }

    /// Header used by the human and markdown printers.
    pub fn title(self) -> &'static str {
        match self {
            Category::BannedPhrases => "Banned phrases",
            Category::SceneContainment => "Scene containment",
            Category::MetaNarrative => "Meta-narrative",
            Category::PovAddress => "POV / address",
            Category::Editorializing => "Editorializing",
            Category::ObjectAnthropomorphism => "Object anthropomorphism",
            Category::DialogueExposition => "Dialogue exposition",
            Category::PovConsistency => "POV consistency",
            Category::LocationMentions => "Location mentions",
            Category::CharacterPresence => "Character presence",
            Category::TimelineConsistency => "Timeline consistency",
        }
    }

    pub fn is_continuity(self) -> bool {
        matches!(
            self,
            Category::LocationMentions
                | Category::CharacterPresence
                | Category::TimelineConsistency
        )
    }

    /// Parse a category name as written in rule files. Accepts `-` or `_`.
    pub fn parse(s: &str) -> Option<Category> {
        let norm = s.trim().to_ascii_lowercase().replace('-', "_");
        Category::ALL.into_iter().find(|c| c.as_str() == norm)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Contiguous byte range of the input text. `line` is the 1-based line of `start`.
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single finding. Immutable once created.
pub struct Violation {
    pub rule_id: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub spans: Vec<TextSpan>,
    pub evidence: String,
    /// Line of text around the first span; empty for scene-level findings.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl Violation {
    /// Start offset of the first span, used for report ordering.
    pub fn start(&self) -> usize {
        self.spans.first().map(|s| s.start).unwrap_or(0)
    }

    /// Line of the first span.
    pub fn line(&self) -> usize {
        self.spans.first().map(|s| s.line).unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Non-fatal problem with the rule set itself, e.g. a malformed regex.
pub struct Diagnostic {
    pub rule_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Ordered, deduplicated lint result for one text.
pub struct LintReport {
    pub violations: Vec<Violation>,
    pub error_count: usize,
    pub warning_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    /// Build a report from raw findings.
    ///
    /// Violations sharing `(rule_id, spans)` are merged keeping the more
    /// severe one; the rest are ordered by category, severity, first span
    /// offset, then rule id and message so output never depends on the order
    /// checks happened to run in.
    pub fn from_violations(violations: Vec<Violation>, diagnostics: Vec<Diagnostic>) -> Self {
        let mut unique: BTreeMap<(String, Vec<TextSpan>), Violation> = BTreeMap::new();
        for v in violations {
            let key = (v.rule_id.clone(), v.spans.clone());
            match unique.get_mut(&key) {
                Some(existing) => {
                    if v.severity < existing.severity {
                        *existing = v;
                    }
                }
                None => {
                    unique.insert(key, v);
                }
            }
        }
        let mut violations: Vec<Violation> = unique.into_values().collect();
        violations.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.severity.cmp(&b.severity))
                .then(a.start().cmp(&b.start()))
                .then(a.rule_id.cmp(&b.rule_id))
                .then(a.message.cmp(&b.message))
        });
        let error_count = violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count();
        let warning_count = violations.len() - error_count;
        LintReport {
            violations,
            error_count,
            warning_count,
            diagnostics,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations grouped under their category, in report order.
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&Violation>> {
        let mut out: BTreeMap<Category, Vec<&Violation>> = BTreeMap::new();
        for v in &self.violations {
            out.entry(v.category).or_default().push(v);
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
/// Lint outcome for one scene file.
pub struct FileReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LintReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Aggregated summary used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub files: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
/// Multi-file lint results container.
pub struct LintResult {
    pub files: Vec<FileReport>,
    pub summary: Summary,
}
