//! Style and continuity checks.
//!
//! Each check pulls its rules from the compiled `RuleSet` and never invents a
//! finding without one: regex rules go through the `PatternMatcher`,
//! structural predicates run only when a rule binds them. Output order here
//! is irrelevant; `LintReport::from_violations` sorts and deduplicates.

pub mod continuity;
pub mod style;
pub mod timeline;

use crate::lexicon::{self, Lexicon};
use crate::matcher::PatternMatcher;
use crate::models::ledger::{AliasTable, LedgerSnapshot};
use crate::models::policy::LintPolicy;
use crate::models::rules::{Rule, Structural};
use crate::models::{Category, TextSpan, Violation};
use crate::rules::RuleSet;
use crate::text::Document;
use regex::Regex;
use std::sync::LazyLock;

static SCENE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:\*[ \t]*){3,}|-{3,}|#{1,6}[ \t]+\S.*)[ \t]*$")
        .expect("scene break regex")
});

/// Words that can open a capitalised run without being part of a name.
const NAME_STOPWORDS: &[&str] = &[
    "a", "after", "an", "and", "as", "at", "before", "but", "even", "everyone", "he", "her",
    "here", "his", "how", "i", "if", "in", "it", "its", "just", "my", "no", "nobody", "now",
    "once", "or", "our", "she", "so", "somebody", "someone", "still", "that", "the", "their",
    "then", "there", "they", "this", "we", "what", "when", "where", "while", "who", "why", "yes",
    "yet", "you", "your",
];

/// Everything a check needs for one pass.
pub struct CheckContext<'a> {
    pub doc: &'a Document<'a>,
    pub rules: &'a RuleSet,
    pub ledger: &'a LedgerSnapshot,
    pub aliases: AliasTable,
    pub matcher: PatternMatcher,
    /// Case-insensitive alternation over every known character surface form.
    names: Option<Regex>,
    /// Offset of the first explicit scene transition, if any.
    transition: Option<usize>,
}

/// One structural hit before it is rendered against its rules.
pub(crate) struct Finding {
    pub spans: Vec<TextSpan>,
    pub evidence: String,
    pub vars: Vec<(&'static str, String)>,
}

impl Finding {
    pub(crate) fn new(span: TextSpan, evidence: impl Into<String>) -> Self {
        Finding {
            spans: vec![span],
            evidence: evidence.into(),
            vars: Vec::new(),
        }
    }

    pub(crate) fn var(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.vars.push((key, value.into()));
        self
    }
}

impl<'a> CheckContext<'a> {
    pub fn new(doc: &'a Document<'a>, rules: &'a RuleSet, ledger: &'a LedgerSnapshot) -> Self {
        let aliases = AliasTable::build(ledger, &rules.policy().cast);
        let names = lexicon::alternation_body(&aliases.surface_forms())
            .and_then(|body| lexicon::build(&format!(r"\b(?:{})\b", body), false));
        let transition = transition_offset(doc, rules.lexicon());
        if let Some(at) = transition {
            tracing::debug!(offset = at, "scene transition marker found");
        }
        CheckContext {
            doc,
            rules,
            ledger,
            aliases,
            matcher: PatternMatcher::new(rules.policy().dedupe),
            names,
            transition,
        }
    }

    pub fn policy(&self) -> &LintPolicy {
        self.rules.policy()
    }

    pub fn lexicon(&self) -> &Lexicon {
        self.rules.lexicon()
    }

    pub(crate) fn names(&self) -> Option<&Regex> {
        self.names.as_ref()
    }

    /// Whether `offset` precedes any explicit transition out of the scene.
    pub(crate) fn before_transition(&self, offset: usize) -> bool {
        self.transition.map_or(true, |t| offset < t)
    }

    /// Run every regex rule of `category` through the matcher.
    pub(crate) fn regex_violations(&self, category: Category) -> Vec<Violation> {
        self.matcher
            .find(self.doc, self.rules.regex_rules(category))
            .into_iter()
            .map(|m| {
                let message = m.rule.render(&[("match", m.evidence.as_str())]);
                let context = self.context(std::slice::from_ref(&m.span));
                Violation {
                    rule_id: m.rule.id.clone(),
                    category: m.rule.category,
                    severity: m.rule.severity,
                    message,
                    spans: vec![m.span],
                    evidence: m.evidence,
                    context,
                }
            })
            .collect()
    }

    /// Excerpt of the line holding the first span. Whole-scene spans get none.
    fn context(&self, spans: &[TextSpan]) -> String {
        match spans.first() {
            Some(span) if *span != self.doc.whole() => self.doc.excerpt(span.start),
            _ => String::new(),
        }
    }

    /// Whether any rule binds `check`; checks skip their work otherwise.
    pub(crate) fn wants(&self, check: Structural) -> bool {
        self.rules.has(check)
    }

    /// Render `findings` once per rule bound to `check`.
    pub(crate) fn emit(&self, check: Structural, findings: Vec<Finding>) -> Vec<Violation> {
        let rules: Vec<&Rule> = self.rules.structural(check).collect();
        let mut out = Vec::with_capacity(findings.len() * rules.len());
        for f in &findings {
            let mut vars: Vec<(&str, &str)> = f.vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
            if !f.vars.iter().any(|(k, _)| *k == "match") {
                vars.push(("match", f.evidence.as_str()));
            }
            for rule in &rules {
                out.push(Violation {
                    rule_id: rule.id.clone(),
                    category: rule.category,
                    severity: rule.severity,
                    message: rule.render(&vars),
                    spans: f.spans.clone(),
                    evidence: f.evidence.clone(),
                    context: self.context(&f.spans),
                });
            }
        }
        out
    }
}

/// First explicit scene transition: a transition phrase in narration, or a
/// scene-break line (`***`, `---`, a markdown heading).
pub(crate) fn transition_offset(doc: &Document<'_>, lexicon: &Lexicon) -> Option<usize> {
    let phrase = lexicon.transitions.as_ref().and_then(|re| {
        re.find_iter(doc.text())
            .find(|m| doc.in_narration(&m.range()))
            .map(|m| m.start())
    });
    let scene_break = SCENE_BREAK.find(doc.text()).map(|m| m.start());
    match (phrase, scene_break) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Strip leading function words from a capitalised run ("Then Jonas" ->
/// "Jonas"). `None` when nothing name-like remains.
pub(crate) fn clean_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .skip_while(|w| NAME_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

/// Whether the match text starts with an uppercase letter.
pub(crate) fn is_capitalised(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

/// Run every style and continuity check.
pub fn run_all(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = style::check(ctx);
    out.extend(continuity::check(ctx));
    out
}
