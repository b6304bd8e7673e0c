//! Style checks: banned phrases, scene containment, meta-narrative,
//! POV/address, editorializing, object anthropomorphism, dialogue
//! exposition and POV consistency.

use super::{clean_name, is_capitalised, CheckContext, Finding};
use crate::models::policy::PovMode;
use crate::models::rules::{RuleScope, Structural};
use crate::models::{Category, Violation};
use crate::text::truncate;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

static SECOND_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:you|your|yours|yourself|yourselves)\b").expect("second person regex")
});
// "I" is only a pronoun when capitalised.
static FIRST_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bI\b|(?i:\b(?:me|my|mine|myself)\b)").expect("first person regex")
});
static COPULA_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:was|were|is|are|seemed|seems|been|looked)\s+(?:so\s+|truly\s+|utterly\s+|quite\s+|very\s+|rather\s+)?$")
        .expect("copula regex")
});

const MINE_NOUN_CUES: &[&str] = &[
    "a", "abandoned", "an", "coal", "copper", "deep", "diamond", "disused", "flooded", "gold",
    "her", "his", "iron", "its", "land", "old", "open", "our", "salt", "silver", "that", "the",
    "their", "this", "tin",
];
const THIRD_PERSON: &[&str] = &["he", "him", "his", "she", "her", "hers"];
const QUOTE_CHARS: &[char] = &['"', '“', '”'];
const EVIDENCE_CHARS: usize = 80;

pub fn check(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = banned_phrases(ctx);
    out.extend(scene_containment(ctx));
    out.extend(meta_narrative(ctx));
    out.extend(pov_address(ctx));
    out.extend(editorializing(ctx));
    out.extend(object_anthropomorphism(ctx));
    out.extend(dialogue_exposition(ctx));
    out.extend(pov_consistency(ctx));
    out
}

pub fn banned_phrases(ctx: &CheckContext<'_>) -> Vec<Violation> {
    ctx.regex_violations(Category::BannedPhrases)
}

pub fn scene_containment(ctx: &CheckContext<'_>) -> Vec<Violation> {
    ctx.regex_violations(Category::SceneContainment)
}

pub fn meta_narrative(ctx: &CheckContext<'_>) -> Vec<Violation> {
    ctx.regex_violations(Category::MetaNarrative)
}

/// Pronouns that break the declared narrative person.
pub fn pov_address(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::PovAddress);
    let mode = ctx.policy().pov;
    if mode != PovMode::Second && ctx.wants(Structural::SecondPersonNarration) {
        let findings = pronoun_findings(ctx, &SECOND_PERSON);
        out.extend(ctx.emit(Structural::SecondPersonNarration, findings));
    }
    if mode != PovMode::First && ctx.wants(Structural::FirstPersonNarration) {
        let findings = pronoun_findings(ctx, &FIRST_PERSON);
        out.extend(ctx.emit(Structural::FirstPersonNarration, findings));
    }
    if mode == PovMode::First && ctx.wants(Structural::PovThirdPerson) {
        out.extend(ctx.emit(Structural::PovThirdPerson, pov_third_person(ctx)));
    }
    out
}

fn pronoun_findings(ctx: &CheckContext<'_>, re: &Regex) -> Vec<Finding> {
    let doc = ctx.doc;
    let hits: Vec<(Range<usize>, ())> = re
        .find_iter(doc.text())
        .map(|m| m.range())
        .filter(|r| !is_noun_mine(doc.text(), r))
        .map(|r| (r, ()))
        .collect();
    ctx.matcher
        .select(doc, hits, RuleScope::Narration)
        .into_iter()
        .map(|(r, _)| Finding::new(doc.span(r.clone()), doc.slice(r)))
        .collect()
}

/// "mine" after a determiner or modifier is the noun ("the old coal mine").
fn is_noun_mine(text: &str, range: &Range<usize>) -> bool {
    if !text[range.clone()].eq_ignore_ascii_case("mine") {
        return false;
    }
    let before = text[..range.start].trim_end();
    let tail = before.len()
        - before
            .chars()
            .rev()
            .take_while(|c| c.is_alphabetic())
            .map(char::len_utf8)
            .sum::<usize>();
    let word = before[tail..].to_lowercase();
    MINE_NOUN_CUES.contains(&word.as_str())
}

enum Mention {
    Name(String),
    Pronoun,
}

/// Third-person pronouns in first-person narration whose nearest preceding
/// named antecedent in the paragraph is the POV character.
fn pov_third_person(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let Some(pov) = ctx.ledger.pov_character.as_deref() else {
        return Vec::new();
    };
    let pov = ctx.aliases.canonical_or(pov).to_string();
    let declared: Vec<String> = ctx
        .aliases
        .pronouns_for(&pov)
        .into_iter()
        .filter(|p| THIRD_PERSON.contains(p))
        .map(str::to_string)
        .collect();
    let candidates: Vec<String> = if declared.is_empty() {
        THIRD_PERSON.iter().map(|p| p.to_string()).collect()
    } else {
        declared
    };
    let doc = ctx.doc;
    let mut hits: Vec<(Range<usize>, ())> = Vec::new();
    for para in doc.paragraphs() {
        let mut events: Vec<(usize, Range<usize>, Mention)> = Vec::new();
        if let Some(names) = ctx.names() {
            for m in names.find_iter(doc.slice(para.clone())) {
                let range = para.start + m.start()..para.start + m.end();
                if !is_capitalised(m.as_str()) || !doc.in_narration(&range) {
                    continue;
                }
                let name = ctx.aliases.canonical_or(m.as_str()).to_string();
                events.push((range.start, range, Mention::Name(name)));
            }
        }
        for (at, word) in doc.words(para.clone()) {
            let range = at..at + word.len();
            if candidates.iter().any(|c| c.eq_ignore_ascii_case(word)) && doc.in_narration(&range)
            {
                events.push((at, range, Mention::Pronoun));
            }
        }
        events.sort_by_key(|(at, _, _)| *at);
        let mut antecedent: Option<String> = None;
        for (_, range, mention) in events {
            match mention {
                Mention::Name(name) => antecedent = Some(name),
                Mention::Pronoun => {
                    if antecedent.as_deref() == Some(pov.as_str()) {
                        hits.push((range, ()));
                    }
                }
            }
        }
    }
    ctx.matcher
        .select(doc, hits, RuleScope::Narration)
        .into_iter()
        .map(|(r, _)| Finding::new(doc.span(r.clone()), doc.slice(r)).var("name", pov.as_str()))
        .collect()
}

pub fn editorializing(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::Editorializing);
    if ctx.wants(Structural::JudgmentLexicon) {
        out.extend(ctx.emit(Structural::JudgmentLexicon, judgment(ctx)));
    }
    out
}

/// Judgment words used as narratorial comment: sentence-initial,
/// comma-delimited, or the complement of a copula.
fn judgment(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let Some(re) = ctx.lexicon().judgment.as_ref() else {
        return Vec::new();
    };
    let doc = ctx.doc;
    let hits: Vec<(Range<usize>, ())> = re
        .find_iter(doc.text())
        .map(|m| m.range())
        .filter(|r| doc.in_narration(r) && is_commentary(ctx, r))
        .map(|r| (r, ()))
        .collect();
    ctx.matcher
        .select(doc, hits, RuleScope::Narration)
        .into_iter()
        .map(|(r, _)| Finding::new(doc.span(r.clone()), doc.slice(r)))
        .collect()
}

fn is_commentary(ctx: &CheckContext<'_>, range: &Range<usize>) -> bool {
    let text = ctx.doc.text();
    let sentence_start = ctx
        .doc
        .sentence_containing(range.start)
        .map_or(0, |s| s.start);
    let before = text[sentence_start..range.start].trim_end();
    let lead = before.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '(' | '—' | '-'));
    if lead.is_empty() {
        return true;
    }
    if before.ends_with(',') || text[range.end..].starts_with(',') {
        return true;
    }
    COPULA_BEFORE.is_match(&text[sentence_start..range.start])
}

pub fn object_anthropomorphism(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::ObjectAnthropomorphism);
    if !ctx.wants(Structural::Anthropomorphism) {
        return out;
    }
    let Some(re) = ctx.lexicon().anthropomorphism.as_ref() else {
        return out;
    };
    let doc = ctx.doc;
    let hits: Vec<(Range<usize>, (String, String))> = re
        .captures_iter(doc.text())
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let noun = caps.name("noun")?.as_str().to_string();
            let verb = caps.name("verb")?.as_str().to_string();
            Some((whole.range(), (noun, verb)))
        })
        .collect();
    let findings = ctx
        .matcher
        .select(doc, hits, RuleScope::Narration)
        .into_iter()
        .map(|(r, (noun, verb))| {
            Finding::new(doc.span(r.clone()), doc.slice(r))
                .var("noun", noun)
                .var("verb", verb)
        })
        .collect();
    out.extend(ctx.emit(Structural::Anthropomorphism, findings));
    out
}

pub fn dialogue_exposition(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::DialogueExposition);
    if ctx.wants(Structural::DialogueMonologue) {
        out.extend(ctx.emit(Structural::DialogueMonologue, monologues(ctx)));
    }
    if ctx.wants(Structural::DialogueBlock) {
        out.extend(ctx.emit(Structural::DialogueBlock, dialogue_blocks(ctx)));
    }
    out
}

/// Long quoted spans with no question, exclamation, address or
/// interaction marker.
fn monologues(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let doc = ctx.doc;
    let max = ctx.policy().dialogue_max_words;
    let interaction = ctx.lexicon().interaction.as_ref();
    let mut out = Vec::new();
    for q in doc.quotes() {
        let count = doc.word_count(q.clone());
        if count <= max {
            continue;
        }
        let body = doc.slice(q.clone());
        let interactive = body.contains('?')
            || body.contains('!')
            || SECOND_PERSON.is_match(body)
            || interaction.is_some_and(|re| re.is_match(body));
        if interactive {
            continue;
        }
        let inner = body.trim_matches(QUOTE_CHARS).trim();
        out.push(
            Finding::new(doc.span(q.clone()), truncate(inner, EVIDENCE_CHARS))
                .var("count", count.to_string()),
        );
    }
    out
}

/// Runs of consecutive lines that all carry quotation marks.
fn dialogue_blocks(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let doc = ctx.doc;
    let limit = ctx.policy().dialogue_block_lines;
    let mut out = Vec::new();
    let mut run: Vec<Range<usize>> = Vec::new();
    let mut flush = |run: &mut Vec<Range<usize>>| {
        if run.len() > limit {
            if let (Some(first), Some(last)) = (run.first(), run.last()) {
                let first_line = doc.line_of(first.start);
                let last_line = doc.line_of(last.start);
                out.push(
                    Finding::new(
                        doc.span(first.start..last.end),
                        format!("Lines {}-{}", first_line, last_line),
                    )
                    .var("count", run.len().to_string()),
                );
            }
        }
        run.clear();
    };
    for line in doc.lines() {
        if doc.slice(line.clone()).contains(QUOTE_CHARS) {
            run.push(line);
        } else {
            flush(&mut run);
        }
    }
    flush(&mut run);
    out
}

pub fn pov_consistency(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::PovConsistency);
    if ctx.wants(Structural::PovAnchorDrift) {
        out.extend(ctx.emit(Structural::PovAnchorDrift, anchor_drift(ctx)));
    }
    out
}

/// Interior-perception anchors ("Jonas realized") for anyone other than the
/// POV character. Without a declared POV character in third person, the
/// first anchored character holds the POV.
fn anchor_drift(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let Some(re) = ctx.lexicon().anchors.as_ref() else {
        return Vec::new();
    };
    let doc = ctx.doc;
    let mut expected: Option<String> = ctx
        .ledger
        .pov_character
        .as_deref()
        .map(|p| ctx.aliases.canonical_or(p).to_string());
    let mut drift: BTreeMap<String, Finding> = BTreeMap::new();
    for caps in re.captures_iter(doc.text()) {
        let (Some(whole), Some(raw)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        if !doc.in_narration(&whole.range()) {
            continue;
        }
        let Some(name) = clean_name(raw.as_str()) else {
            continue;
        };
        let name = ctx.aliases.canonical_or(&name).to_string();
        let pov = match expected.clone() {
            Some(pov) => pov,
            None if ctx.policy().pov == PovMode::Third => {
                expected = Some(name.clone());
                continue;
            }
            None => continue,
        };
        if name.eq_ignore_ascii_case(&pov) {
            continue;
        }
        if let Some(existing) = drift.get_mut(&name) {
            existing.spans.push(doc.span(whole.range()));
            continue;
        }
        drift.insert(
            name.clone(),
            Finding::new(doc.span(whole.range()), whole.as_str())
                .var("name", name)
                .var("expected", pov),
        );
    }
    drift.into_values().collect()
}
