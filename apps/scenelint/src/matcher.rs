//! Pattern matcher for compiled regex rules.
//!
//! Applies pre-compiled rules to a `Document`, honouring each rule's scope
//! (anywhere / narration / dialogue) and collapsing repeated hits of the same
//! rule inside one dedupe window so a single clumsy sentence does not inflate
//! the violation count.

use crate::models::policy::DedupeWindow;
use crate::models::rules::{Rule, RuleScope};
use crate::models::TextSpan;
use crate::rules::CompiledRule;
use crate::text::Document;
use regex::Regex;
use std::ops::Range;

#[derive(Debug, Clone)]
/// One kept hit of a rule.
pub struct RuleMatch<'r> {
    pub rule: &'r Rule,
    pub span: TextSpan,
    pub evidence: String,
}

#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher {
    window: DedupeWindow,
}

impl PatternMatcher {
    pub fn new(window: DedupeWindow) -> Self {
        PatternMatcher { window }
    }

    /// Apply `rules` to `doc`. Results are grouped by rule in input order,
    /// then by offset.
    pub fn find<'r, I>(&self, doc: &Document<'_>, rules: I) -> Vec<RuleMatch<'r>>
    where
        I: IntoIterator<Item = &'r CompiledRule>,
    {
        let mut out = Vec::new();
        for compiled in rules {
            let Some(re) = compiled.regex() else {
                continue;
            };
            for range in self.ranges(doc, re, compiled.rule.scope) {
                out.push(RuleMatch {
                    rule: &compiled.rule,
                    span: doc.span(range.clone()),
                    evidence: doc.slice(range).to_string(),
                });
            }
        }
        out
    }

    /// Scope-filtered, deduplicated match ranges of a single regex.
    pub fn ranges(&self, doc: &Document<'_>, re: &Regex, scope: RuleScope) -> Vec<Range<usize>> {
        let hits = re
            .find_iter(doc.text())
            .filter(|m| !m.range().is_empty())
            .map(|m| (m.range(), ()))
            .collect();
        self.select(doc, hits, scope)
            .into_iter()
            .map(|(r, _)| r)
            .collect()
    }

    /// Keep the hits that fall in `scope`, then drop any hit inside the
    /// dedupe window of the previous kept one. `hits` must be sorted by start.
    pub fn select<T>(
        &self,
        doc: &Document<'_>,
        hits: Vec<(Range<usize>, T)>,
        scope: RuleScope,
    ) -> Vec<(Range<usize>, T)> {
        let mut kept: Vec<(Range<usize>, T)> = Vec::new();
        for (range, payload) in hits {
            let in_scope = match scope {
                RuleScope::Anywhere => true,
                RuleScope::Narration => doc.in_narration(&range),
                RuleScope::Dialogue => doc.in_dialogue(range.start),
            };
            if !in_scope {
                continue;
            }
            if let Some((last, _)) = kept.last() {
                if self.same_window(doc, last, &range) {
                    continue;
                }
            }
            kept.push((range, payload));
        }
        kept
    }

    fn same_window(&self, doc: &Document<'_>, last: &Range<usize>, next: &Range<usize>) -> bool {
        match self.window {
            DedupeWindow::Off => false,
            DedupeWindow::Sentence => doc.sentence_index(last.start) == doc.sentence_index(next.start),
            DedupeWindow::Tokens(n) => {
                if next.start <= last.end {
                    return true;
                }
                doc.word_count(last.end..next.start) <= n
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::LintPolicy;
    use crate::models::{Category, Severity};
    use crate::rules::RuleSet;

    fn set(rules: Vec<Rule>) -> RuleSet {
        RuleSet::compile(rules, LintPolicy::default())
    }

    #[test]
    fn test_repeats_within_a_sentence_collapse() {
        let rs = set(vec![Rule::regex(
            "very",
            Category::BannedPhrases,
            Severity::Warning,
            r"\bvery\b",
            "m",
        )]);
        let doc = Document::new("It was very, very cold. Very.");
        let hits = PatternMatcher::new(DedupeWindow::Sentence).find(&doc, rs.rules());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].span.start, 7);
        assert_eq!(hits[1].evidence, "Very");

        let all = PatternMatcher::new(DedupeWindow::Off).find(&doc, rs.rules());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_token_window() {
        let rs = set(vec![Rule::regex(
            "x",
            Category::BannedPhrases,
            Severity::Warning,
            r"\bgrim\b",
            "m",
        )]);
        let doc = Document::new("grim one two grim one two three four grim");
        let hits = PatternMatcher::new(DedupeWindow::Tokens(2)).find(&doc, rs.rules());
        let starts: Vec<usize> = hits.iter().map(|h| h.span.start).collect();
        assert_eq!(starts, vec![0, 37]);
    }

    #[test]
    fn test_narration_scope_skips_dialogue() {
        let rs = set(vec![Rule::regex(
            "reader",
            Category::MetaNarrative,
            Severity::Error,
            r"\breader\b",
            "m",
        )
        .with_scope(RuleScope::Narration)]);
        let doc = Document::new("\"The reader is mine,\" she said.\n\nThe reader would know.");
        let hits = PatternMatcher::new(DedupeWindow::Sentence).find(&doc, rs.rules());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].span.line, 3);
    }

    #[test]
    fn test_matching_is_case_insensitive_by_default() {
        let rs = set(vec![Rule::regex(
            "a",
            Category::BannedPhrases,
            Severity::Error,
            "suddenly, without warning",
            "m",
        )]);
        let doc = Document::new("Suddenly, Without Warning, the lights died.");
        let hits = PatternMatcher::new(DedupeWindow::Sentence).find(&doc, rs.rules());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].evidence, "Suddenly, Without Warning");
    }
}
