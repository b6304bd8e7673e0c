//! Rule schema: one declarative rule per style or continuity check.
//!
//! A rule is either a regex applied by the pattern matcher or a named
//! structural predicate implemented in `checks`. Every violation carries the
//! id of the rule that produced it, so removing a rule from the set removes
//! its findings.

use super::{Category, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which part of the text a regex rule inspects.
pub enum RuleScope {
    #[default]
    Anywhere,
    /// Only text outside quoted dialogue.
    Narration,
    /// Only text inside quoted dialogue.
    Dialogue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Built-in structural predicates.
pub enum Structural {
    SecondPersonNarration,
    FirstPersonNarration,
    PovThirdPerson,
    JudgmentLexicon,
    Anthropomorphism,
    DialogueMonologue,
    DialogueBlock,
    PovAnchorDrift,
    LocationMention,
    LocationUnanchored,
    UnlistedCharacter,
    AbsentCharacter,
    TimeOfDay,
    ElapsedBound,
    ElapsedSinceLastScene,
}

impl Structural {
    /// Category every rule using this predicate reports under.
    pub fn category(self) -> Category {
        match self {
            Structural::SecondPersonNarration
            | Structural::FirstPersonNarration
            | Structural::PovThirdPerson => Category::PovAddress,
            Structural::JudgmentLexicon => Category::Editorializing,
            Structural::Anthropomorphism => Category::ObjectAnthropomorphism,
            Structural::DialogueMonologue | Structural::DialogueBlock => {
                Category::DialogueExposition
            }
            Structural::PovAnchorDrift => Category::PovConsistency,
            Structural::LocationMention | Structural::LocationUnanchored => {
                Category::LocationMentions
            }
            Structural::UnlistedCharacter | Structural::AbsentCharacter => {
                Category::CharacterPresence
            }
            Structural::TimeOfDay | Structural::ElapsedBound | Structural::ElapsedSinceLastScene => {
                Category::TimelineConsistency
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePattern {
    Regex(String),
    Structural(Structural),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A loaded rule. Immutable; identified by `id` for suppression and overrides.
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub pattern: RulePattern,
    /// Message template. Supports `{match}`, `{name}`, `{expected}`,
    /// `{found}`, `{count}` and any check-specific keys.
    pub message: String,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Rule {
    pub fn regex(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Rule {
            id: id.into(),
            category,
            severity,
            pattern: RulePattern::Regex(pattern.into()),
            message: message.into(),
            scope: RuleScope::Anywhere,
            case_sensitive: false,
        }
    }

    pub fn structural(
        id: impl Into<String>,
        check: Structural,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Rule {
            id: id.into(),
            category: check.category(),
            severity,
            pattern: RulePattern::Structural(check),
            message: message.into(),
            scope: RuleScope::Narration,
            case_sensitive: false,
        }
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    pub fn structural_check(&self) -> Option<Structural> {
        match self.pattern {
            RulePattern::Structural(s) => Some(s),
            RulePattern::Regex(_) => None,
        }
    }

    /// Fill the message template. Unknown placeholders are left as written.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut out = self.message.clone();
        for (key, value) in vars {
            out = out.replace(&format!("{{{}}}", key), value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_known_placeholders_only() {
        let rule = Rule::structural(
            "character_presence.unlisted",
            Structural::UnlistedCharacter,
            Severity::Error,
            "{name} acts but is not listed ({other})",
        );
        assert_eq!(rule.render(&[("name", "Jonas")]), "Jonas acts but is not listed ({other})");
        assert_eq!(rule.category, Category::CharacterPresence);
    }

    #[test]
    fn test_structural_rules_default_to_narration_scope() {
        let rule = Rule::structural("x", Structural::Anthropomorphism, Severity::Warning, "m");
        assert_eq!(rule.scope, RuleScope::Narration);
        assert_eq!(rule.structural_check(), Some(Structural::Anthropomorphism));
        let re = Rule::regex("y", Category::BannedPhrases, Severity::Error, "foo", "m");
        assert_eq!(re.scope, RuleScope::Anywhere);
        assert_eq!(re.structural_check(), None);
    }
}
