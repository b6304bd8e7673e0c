//! Rule file schemas: `style_rules.yaml` and `banned_phrases.yaml`.
//!
//! Style rules are split into `hard_rules` (errors) and `soft_preferences`
//! (warnings). Banned phrases are split into `banned_regex` (errors) and
//! `warn_regex` (warnings); entries are bare patterns or detailed tables.

use super::rules::{Rule, RuleScope};
use super::{Category, Severity};
use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;

#[derive(Deserialize, Default)]
/// Top-level style rules file.
pub struct StyleRulesFile {
    #[serde(default)]
    pub hard_rules: Vec<StyleRuleEntry>,
    #[serde(default)]
    pub soft_preferences: Vec<StyleRuleEntry>,
}

#[derive(Deserialize)]
/// One regex style rule.
pub struct StyleRuleEntry {
    pub id: String,
    pub category: String,
    pub pattern: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scope: Option<RuleScope>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Deserialize, Default)]
/// Top-level banned phrases file.
pub struct BannedPhrasesFile {
    #[serde(default)]
    pub banned_regex: Vec<PhraseEntry>,
    #[serde(default)]
    pub warn_regex: Vec<PhraseEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
/// A banned/caution phrase: either a bare pattern or a detailed entry.
pub enum PhraseEntry {
    Pattern(String),
    Detailed {
        #[serde(default)]
        id: Option<String>,
        pattern: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl StyleRulesFile {
    /// Convert entries to rules. Style rules default to narration scope.
    pub fn into_rules(self) -> ConfigResult<Vec<Rule>> {
        let mut out = Vec::new();
        for (entries, severity) in [
            (self.hard_rules, Severity::Error),
            (self.soft_preferences, Severity::Warning),
        ] {
            for e in entries {
                let category =
                    Category::parse(&e.category).ok_or_else(|| ConfigError::UnknownCategory {
                        id: e.id.clone(),
                        category: e.category.clone(),
                    })?;
                let message = e
                    .message
                    .unwrap_or_else(|| format!("{}: {{match}}", category.title()));
                let mut rule = Rule::regex(e.id, category, severity, e.pattern, message)
                    .with_scope(e.scope.unwrap_or(RuleScope::Narration));
                if e.case_sensitive {
                    rule = rule.case_sensitive();
                }
                out.push(rule);
            }
        }
        Ok(out)
    }
}

impl BannedPhrasesFile {
    /// Convert entries to `banned_phrases` rules. Generated ids are stable by
    /// list and position: `banned_phrases.banned.0`, `banned_phrases.caution.2`.
    pub fn into_rules(self) -> Vec<Rule> {
        let mut out = Vec::new();
        for (entries, severity, list, prefix) in [
            (self.banned_regex, Severity::Error, "banned", "Banned"),
            (self.warn_regex, Severity::Warning, "caution", "Caution"),
        ] {
            for (i, entry) in entries.into_iter().enumerate() {
                let default_id = format!("banned_phrases.{}.{}", list, i);
                let default_msg = format!("{}: {{match}}", prefix);
                let rule = match entry {
                    PhraseEntry::Pattern(p) => {
                        Rule::regex(default_id, Category::BannedPhrases, severity, p, default_msg)
                    }
                    PhraseEntry::Detailed {
                        id,
                        pattern,
                        message,
                        case_sensitive,
                    } => {
                        let r = Rule::regex(
                            id.unwrap_or(default_id),
                            Category::BannedPhrases,
                            severity,
                            pattern,
                            message.unwrap_or(default_msg),
                        );
                        if case_sensitive {
                            r.case_sensitive()
                        } else {
                            r
                        }
                    }
                };
                out.push(rule);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banned_file_mixes_bare_and_detailed_entries() {
        let file: BannedPhrasesFile = serde_yaml::from_str(
            r#"
banned_regex:
  - "suddenly, without warning"
  - id: no-heart-pound
    pattern: "heart (?:pounded|hammered)"
    message: "Cliche: {match}"
warn_regex:
  - "\\bvery\\b"
"#,
        )
        .unwrap();
        let rules = file.into_rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].id, "banned_phrases.banned.0");
        assert_eq!(rules[0].severity, Severity::Error);
        assert_eq!(rules[1].id, "no-heart-pound");
        assert_eq!(rules[1].message, "Cliche: {match}");
        assert_eq!(rules[2].id, "banned_phrases.caution.0");
        assert_eq!(rules[2].severity, Severity::Warning);
        assert_eq!(rules[2].message, "Caution: {match}");
    }

    #[test]
    fn test_style_file_maps_hard_and_soft_severity() {
        let file: StyleRulesFile = serde_yaml::from_str(
            r#"
hard_rules:
  - id: no-dream
    category: scene-containment
    pattern: "\\bdreamed of\\b"
soft_preferences:
  - id: no-sigh
    category: editorializing
    pattern: "\\bsighed\\b"
    scope: anywhere
"#,
        )
        .unwrap();
        let rules = file.into_rules().unwrap();
        assert_eq!(rules[0].severity, Severity::Error);
        assert_eq!(rules[0].category, Category::SceneContainment);
        assert_eq!(rules[0].scope, RuleScope::Narration);
        assert_eq!(rules[1].severity, Severity::Warning);
        assert_eq!(rules[1].scope, RuleScope::Anywhere);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let file: StyleRulesFile = serde_yaml::from_str(
            r#"
hard_rules:
  - id: x
    category: plot_holes
    pattern: "x"
"#,
        )
        .unwrap();
        let err = file.into_rules().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCategory { ref category, .. } if category == "plot_holes"));
    }
}
