//! Rule set compilation.
//!
//! `RuleSet::compile` turns loaded rules into matchers exactly once. A rule
//! whose regex fails to compile, or that reuses an id already in the set, is
//! skipped with a warning and recorded as a diagnostic; it never blocks the
//! rest of the set. A compiled set is immutable and `Send + Sync`, so one
//! instance can serve concurrent lint passes.

use crate::error::RulePatternError;
use crate::lexicon::Lexicon;
use crate::models::policy::LintPolicy;
use crate::models::rules::{Rule, RulePattern, Structural};
use crate::models::{Category, Diagnostic};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

#[derive(Debug)]
/// A rule paired with its compiled regex (structural rules have none).
pub struct CompiledRule {
    pub rule: Rule,
    pub(crate) regex: Option<Regex>,
}

impl CompiledRule {
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }
}

#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    lexicon: Lexicon,
    diagnostics: Vec<Diagnostic>,
}

fn compile_pattern(rule: &Rule, pattern: &str) -> Result<Regex, RulePatternError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!rule.case_sensitive)
        .build()
        .map_err(|source| RulePatternError {
            rule_id: rule.id.clone(),
            source,
        })
}

impl RuleSet {
    pub fn compile(rules: Vec<Rule>, policy: LintPolicy) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut diagnostics = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for rule in rules {
            if seen.contains(&rule.id) {
                tracing::warn!(rule = %rule.id, "duplicate rule id; keeping the first definition");
                diagnostics.push(Diagnostic {
                    rule_id: rule.id.clone(),
                    message: format!("duplicate rule id '{}' ignored", rule.id),
                });
                continue;
            }
            let regex = match &rule.pattern {
                RulePattern::Regex(p) => match compile_pattern(&rule, p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(rule = %e.rule_id, error = %e.source, "skipping rule with malformed pattern");
                        diagnostics.push(Diagnostic {
                            rule_id: e.rule_id.clone(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                },
                RulePattern::Structural(_) => None,
            };
            // A malformed rule does not claim its id.
            seen.insert(rule.id.clone());
            compiled.push(CompiledRule { rule, regex });
        }
        tracing::debug!(
            rules = compiled.len(),
            skipped = diagnostics.len(),
            "compiled rule set"
        );
        RuleSet {
            rules: compiled,
            lexicon: Lexicon::compile(policy),
            diagnostics,
        }
    }

    /// Built-in style and continuity rules under the given policy.
    pub fn builtin(policy: LintPolicy) -> Self {
        RuleSet::compile(crate::defaults::builtin_rules(), policy)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().map(|c| &c.rule).find(|r| r.id == id)
    }

    /// Regex rules of one category, in set order.
    pub fn regex_rules(&self, category: Category) -> impl Iterator<Item = &CompiledRule> {
        self.rules
            .iter()
            .filter(move |c| c.rule.category == category && c.regex.is_some())
    }

    /// Rules bound to a structural predicate.
    pub fn structural(&self, check: Structural) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .map(|c| &c.rule)
            .filter(move |r| r.structural_check() == Some(check))
    }

    pub fn has(&self, check: Structural) -> bool {
        self.structural(check).next().is_some()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn policy(&self) -> &LintPolicy {
        &self.lexicon.policy
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
