//! Compiled form of the lint policy's word lists.
//!
//! Lexicon regexes are built once when a `RuleSet` is compiled and shared
//! read-only by every pass. Entries are escaped, so user-supplied words can
//! never produce an invalid pattern.

use crate::models::policy::LintPolicy;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

/// A capitalised personal name of one or two words ("Jonas", "Mira Vance", "O'Brien").
pub(crate) const NAME: &str = r"[A-Z][A-Za-z-]*(?:['’][A-Z][A-Za-z-]*)?(?:\s+[A-Z][A-Za-z-]*(?:['’][A-Z][A-Za-z-]*)?)?";

/// Case-insensitive `\b(?:w1|w2|...)\b` over `words`, longest first.
pub(crate) fn word_alternation(words: &[String]) -> Option<Regex> {
    let body = alternation_body(words)?;
    build(&format!(r"\b(?:{})\b", body), false)
}

/// Escaped alternation body, longest first; `None` when `words` is empty.
pub(crate) fn alternation_body<S: AsRef<str>>(words: &[S]) -> Option<String> {
    let mut items: Vec<String> = words
        .iter()
        .map(|w| {
            w.as_ref()
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|w| !w.is_empty())
        .collect();
    if items.is_empty() {
        return None;
    }
    items.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    items.dedup();
    Some(items.join("|"))
}

pub(crate) fn build(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "lexicon pattern failed to compile; check disabled");
            None
        }
    }
}

#[derive(Debug)]
/// Precompiled lexicon matchers plus the policy they came from.
pub struct Lexicon {
    pub policy: LintPolicy,
    pub judgment: Option<Regex>,
    pub anthropomorphism: Option<Regex>,
    pub interaction: Option<Regex>,
    pub transitions: Option<Regex>,
    /// Lowercased surface form -> canonical location.
    pub location_forms: BTreeMap<String, String>,
    /// `<Name> [adverb] <perception verb>`; case-sensitive.
    pub anchors: Option<Regex>,
    /// Speech attribution right after a closing quote: `Jonas said` / `said Jonas`.
    pub attribution_after: Option<Regex>,
    /// Speech attribution right before an opening quote: `Jonas said,`.
    pub attribution_before: Option<Regex>,
}

impl Lexicon {
    pub fn compile(policy: LintPolicy) -> Self {
        let anthropomorphism = match (
            alternation_body(&policy.inanimate_nouns),
            alternation_body(&policy.animate_verbs),
        ) {
            (Some(nouns), Some(verbs)) => build(
                &format!(
                    r"\b(?P<noun>{})\b(?:\s+[\w'’]+){{0,{}}}?\s+(?P<verb>{})\b",
                    nouns, policy.anthropomorphism_gap, verbs
                ),
                false,
            ),
            _ => None,
        };
        let mut location_forms = BTreeMap::new();
        for (name, aliases) in &policy.locations {
            insert_location_form(&mut location_forms, name, name);
            for a in aliases {
                insert_location_form(&mut location_forms, a, name);
            }
        }
        let anchors = alternation_body(&policy.perception_verbs).and_then(|verbs| {
            build(
                &format!(
                    r"\b(?P<name>{})\s+(?:[a-z]+ly\s+)?(?P<verb>{})\b",
                    NAME, verbs
                ),
                true,
            )
        });
        let speech = alternation_body(&policy.speech_verbs);
        let attribution_after = speech.as_ref().and_then(|verbs| {
            build(
                &format!(
                    r"^[\s,;:—–-]*(?:(?P<n1>{name})\s+(?:[a-z]+ly\s+)?(?:{verbs})|(?:{verbs})\s+(?P<n2>{name}))\b",
                    name = NAME,
                    verbs = verbs
                ),
                true,
            )
        });
        let attribution_before = speech.as_ref().and_then(|verbs| {
            build(
                &format!(
                    r"\b(?P<n>{})\s+(?:[a-z]+ly\s+)?(?:{})\s*[,:]?\s*$",
                    NAME, verbs
                ),
                true,
            )
        });
        Lexicon {
            judgment: word_alternation(&policy.judgment_lexicon),
            anthropomorphism,
            interaction: word_alternation(&policy.interaction_markers),
            transitions: word_alternation(&policy.transition_phrases),
            location_forms,
            anchors,
            attribution_after,
            attribution_before,
            policy,
        }
    }

    /// Canonical location for a surface form, if configured.
    pub fn location(&self, surface: &str) -> Option<&str> {
        self.location_forms
            .get(&normalise_form(surface))
            .map(String::as_str)
    }

    pub fn is_generic_role(&self, name: &str) -> bool {
        self.policy
            .generic_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(name.trim()))
    }
}

/// Lowercased with internal whitespace collapsed; the key form for
/// location lookups.
pub(crate) fn normalise_form(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Register `surface` (and its article-less form) as naming `canonical`.
pub(crate) fn insert_location_form(
    forms: &mut BTreeMap<String, String>,
    surface: &str,
    canonical: &str,
) {
    let key = normalise_form(surface);
    if key.is_empty() {
        return;
    }
    if let Some(bare) = key.strip_prefix("the ") {
        forms
            .entry(bare.trim().to_string())
            .or_insert_with(|| canonical.to_string());
    }
    forms.insert(key, canonical.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternation_escapes_and_prefers_longest() {
        let words = vec!["a.b".to_string(), "later that".to_string(), "".to_string()];
        let body = alternation_body(&words).unwrap();
        assert_eq!(body, r"later\s+that|a\.b");
        assert!(alternation_body::<String>(&[]).is_none());
    }

    #[test]
    fn test_anthropomorphism_regex_respects_gap() {
        let lex = Lexicon::compile(LintPolicy::default());
        let re = lex.anthropomorphism.as_ref().unwrap();
        assert!(re.is_match("The silence watched them."));
        assert!(re.is_match("The old clock on the wall waited."));
        assert!(!re.is_match("The door had been left open for hours while nobody waited."));
        let caps = re.captures("the mirror quietly judged her").unwrap();
        assert_eq!(&caps["noun"], "mirror");
        assert_eq!(&caps["verb"], "judged");
    }

    #[test]
    fn test_location_forms_resolve_aliases() {
        let mut policy = LintPolicy::default();
        policy
            .locations
            .insert("Harbor".into(), vec!["the docks".into()]);
        let lex = Lexicon::compile(policy);
        assert_eq!(lex.location("The Docks"), Some("Harbor"));
        assert_eq!(lex.location("docks"), Some("Harbor"));
        assert_eq!(lex.location("harbor"), Some("Harbor"));
        assert!(lex.is_generic_role("Staff"));
    }

    #[test]
    fn test_attribution_patterns() {
        let lex = Lexicon::compile(LintPolicy::default());
        let after = lex.attribution_after.as_ref().unwrap();
        let caps = after.captures(" Jonas said quietly.").unwrap();
        assert_eq!(&caps["n1"], "Jonas");
        let caps = after.captures(", said Mira Vance.").unwrap();
        assert_eq!(&caps["n2"], "Mira Vance");
        assert!(after.captures(" she said.").is_none());
        let before = lex.attribution_before.as_ref().unwrap();
        let caps = before.captures("The rain kept on. Jonas muttered, ").unwrap();
        assert_eq!(&caps["n"], "Jonas");
        let anchors = lex.anchors.as_ref().unwrap();
        let caps = anchors.captures("Jonas suddenly realized the truth").unwrap();
        assert_eq!(&caps["name"], "Jonas");
        assert_eq!(&caps["verb"], "realized");
    }
}
