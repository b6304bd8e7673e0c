//! Continuity checks against the ledger: location mentions, character
//! presence, and (via `timeline`) time-of-day and elapsed-time consistency.

use super::{clean_name, is_capitalised, timeline, CheckContext, Finding};
use crate::lexicon::{alternation_body, build, insert_location_form, normalise_form};
use crate::models::policy::PovMode;
use crate::models::rules::Structural;
use crate::models::{Category, Violation};
use regex::Match;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Verbs that put a named character physically in the scene.
const ACTION_VERBS: &[&str] = &[
    "came", "comes", "drew", "draws", "fell", "falls", "gets", "got", "goes", "held", "holds",
    "kept", "keeps", "laughs", "leans", "left", "leaves", "looks", "makes", "made", "moves", "nods",
    "ran", "reaches", "rose", "runs", "sat", "says", "shook", "sits", "smiles", "spoke", "stands",
    "steps", "stood", "took", "takes", "turns", "waits", "walks", "went",
];

pub fn check(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = location_mentions(ctx);
    out.extend(character_presence(ctx));
    out.extend(timeline::check(ctx));
    out
}

/// Known locations other than the ledger's, mentioned in narration before
/// any transition; plus a scene that never names where it is.
pub fn location_mentions(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::LocationMentions);
    let want_mention = ctx.wants(Structural::LocationMention);
    let want_anchor = ctx.wants(Structural::LocationUnanchored);
    if !want_mention && !want_anchor {
        return out;
    }
    let doc = ctx.doc;
    let lex = ctx.lexicon();
    let ledger = ctx.ledger;
    let current = lex
        .location(&ledger.location)
        .unwrap_or(ledger.location.trim())
        .to_string();
    let previous = ledger
        .location_previous
        .as_deref()
        .map(|p| lex.location(p).unwrap_or(p.trim()).to_string());
    let mut forms = lex.location_forms.clone();
    insert_location_form(&mut forms, &ledger.location, &current);
    let keys: Vec<&String> = forms.keys().collect();
    let Some(re) = alternation_body(&keys).and_then(|b| build(&format!(r"\b(?:{})\b", b), false))
    else {
        return out;
    };

    let mut anchored = false;
    let mut foreign: BTreeMap<String, Finding> = BTreeMap::new();
    for m in re.find_iter(doc.text()) {
        let Some(canonical) = forms.get(&normalise_form(m.as_str())) else {
            continue;
        };
        if canonical.eq_ignore_ascii_case(&current) {
            anchored = true;
            continue;
        }
        // Naming where the characters came from is not a jump.
        if previous
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(canonical))
        {
            continue;
        }
        if !doc.in_narration(&m.range()) || !ctx.before_transition(m.start()) {
            continue;
        }
        let span = doc.span(m.range());
        match foreign.get_mut(canonical) {
            Some(f) => f.spans.push(span),
            None => {
                foreign.insert(
                    canonical.clone(),
                    Finding::new(span, m.as_str())
                        .var("found", canonical.as_str())
                        .var("expected", current.as_str()),
                );
            }
        }
    }
    if want_mention {
        out.extend(ctx.emit(Structural::LocationMention, foreign.into_values().collect()));
    }
    if want_anchor && !anchored && doc.len() > ctx.policy().location_anchor_min_chars {
        let finding = Finding::new(doc.whole(), current.as_str()).var("expected", current.as_str());
        out.extend(ctx.emit(Structural::LocationUnanchored, vec![finding]));
    }
    out
}

pub fn character_presence(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::CharacterPresence);
    if ctx.wants(Structural::UnlistedCharacter) {
        out.extend(ctx.emit(Structural::UnlistedCharacter, unlisted(ctx)));
    }
    if ctx.wants(Structural::AbsentCharacter) {
        out.extend(ctx.emit(Structural::AbsentCharacter, absent(ctx)));
    }
    out
}

fn listed(ctx: &CheckContext<'_>, canonical: &str) -> bool {
    ctx.ledger
        .characters_present
        .iter()
        .any(|p| ctx.aliases.canonical_or(p).eq_ignore_ascii_case(canonical))
}

/// Range of `cleaned` inside the raw capture `m` ("Then Jonas" -> "Jonas").
fn name_range(base: usize, m: Match<'_>, cleaned: &str) -> Range<usize> {
    let raw = m.as_str();
    if raw.ends_with(cleaned) {
        base + m.end() - cleaned.len()..base + m.end()
    } else {
        base + m.start()..base + m.end()
    }
}

fn record(
    ctx: &CheckContext<'_>,
    actors: &mut BTreeMap<String, Finding>,
    name: &str,
    range: Range<usize>,
) {
    let canonical = ctx.aliases.canonical_or(name).to_string();
    if listed(ctx, &canonical) || ctx.lexicon().is_generic_role(&canonical) {
        return;
    }
    // "Mira Vance" is Mira when only the first name is on the ledger.
    if name
        .split_whitespace()
        .any(|w| ctx.aliases.resolve(w).is_some_and(|c| listed(ctx, c)))
    {
        return;
    }
    let span = ctx.doc.span(range);
    match actors.get_mut(&canonical) {
        Some(f) => {
            if !f.spans.contains(&span) {
                f.spans.push(span);
            }
        }
        None => {
            actors.insert(
                canonical.clone(),
                Finding::new(span, name).var("name", canonical),
            );
        }
    }
}

/// Characters who speak (speech attribution next to a quote) or act (a known
/// name followed by an action verb in narration) without being listed.
fn unlisted(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let doc = ctx.doc;
    let text = doc.text();
    let lex = ctx.lexicon();
    let mut actors: BTreeMap<String, Finding> = BTreeMap::new();

    let quotes = doc.quotes();
    for (i, q) in quotes.iter().enumerate() {
        let para = doc.paragraph_containing(q.start).unwrap_or(0..doc.len());
        if let Some(re) = lex.attribution_after.as_ref() {
            let end = quotes
                .get(i + 1)
                .map_or(para.end, |next| next.start.min(para.end))
                .max(q.end);
            if let Some(caps) = re.captures(&text[q.end..end]) {
                if let Some(m) = caps.name("n1").or_else(|| caps.name("n2")) {
                    if let Some(name) = clean_name(m.as_str()) {
                        let range = name_range(q.end, m, &name);
                        record(ctx, &mut actors, &name, range);
                    }
                }
            }
        }
        if let Some(re) = lex.attribution_before.as_ref() {
            let start = match i {
                0 => para.start,
                _ => quotes[i - 1].end.max(para.start),
            }
            .min(q.start);
            if let Some(m) = re.captures(&text[start..q.start]).and_then(|c| c.name("n")) {
                if let Some(name) = clean_name(m.as_str()) {
                    let range = name_range(start, m, &name);
                    record(ctx, &mut actors, &name, range);
                }
            }
        }
    }

    if let Some(names) = ctx.names() {
        for m in names.find_iter(text) {
            if !is_capitalised(m.as_str()) || !doc.in_narration(&m.range()) {
                continue;
            }
            let next = text[m.end()..]
                .trim_start_matches([' ', '\t'])
                .split(|c: char| !c.is_alphabetic())
                .next()
                .unwrap_or("");
            if is_action(next) {
                record(ctx, &mut actors, m.as_str(), m.range());
            }
        }
    }
    actors.into_values().collect()
}

fn is_action(word: &str) -> bool {
    let w = word.to_lowercase();
    ACTION_VERBS.contains(&w.as_str()) || (w.len() > 3 && w.ends_with("ed"))
}

/// Listed characters the text never names. All of them are reported in one
/// scene-level finding.
fn absent(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let mentioned: BTreeSet<String> = ctx
        .names()
        .map(|re| {
            re.find_iter(ctx.doc.text())
                .map(|m| ctx.aliases.canonical_or(m.as_str()).to_lowercase())
                .collect()
        })
        .unwrap_or_default();
    // A first- or second-person narrator is present without being named.
    let narrator = match ctx.policy().pov {
        PovMode::Third => None,
        _ => ctx
            .ledger
            .pov_character
            .as_deref()
            .map(|p| ctx.aliases.canonical_or(p).to_lowercase()),
    };
    let missing: Vec<&str> = ctx
        .ledger
        .characters_present
        .iter()
        .map(|p| p.trim())
        .filter(|p| !ctx.lexicon().is_generic_role(p))
        .filter(|p| {
            let canonical = ctx.aliases.canonical_or(p).to_lowercase();
            !mentioned.contains(&canonical) && narrator.as_deref() != Some(canonical.as_str())
        })
        .collect();
    if missing.is_empty() {
        return Vec::new();
    }
    let names = missing.join("', '");
    vec![Finding::new(ctx.doc.whole(), missing.join(", ")).var("name", names)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ledger::LedgerSnapshot;
    use crate::models::policy::LintPolicy;
    use crate::rules::RuleSet;
    use crate::text::Document;

    fn run(text: &str, policy: LintPolicy, ledger: &LedgerSnapshot) -> Vec<Violation> {
        let set = RuleSet::builtin(policy);
        let doc = Document::new(text);
        let ctx = CheckContext::new(&doc, &set, ledger);
        let mut out = location_mentions(&ctx);
        out.extend(character_presence(&ctx));
        out
    }

    fn harbor_policy() -> LintPolicy {
        let mut policy = LintPolicy::default();
        policy
            .locations
            .insert("Harbor".into(), vec!["the docks".into()]);
        policy.locations.insert("Library".into(), vec![]);
        policy
    }

    #[test]
    fn test_unexpected_location_before_transition() {
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        let out = run(
            "Mira shelved the last book in the library. The docks smelled of tar.",
            harbor_policy(),
            &l,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule_id, "location_mentions.unexpected");
        assert_eq!(
            out[0].message,
            "Mentions Harbor but the scene is set in Library, with no transition"
        );

        let out = run(
            "Mira shelved the last book in the library. Hours later, the docks smelled of tar.",
            harbor_policy(),
            &l,
        );
        assert!(out.is_empty(), "{:?}", out);
    }

    #[test]
    fn test_previous_location_is_not_a_jump() {
        let mut l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        l.location_previous = Some("Harbor".into());
        let out = run(
            "Mira still smelled the docks on her coat as she entered the library.",
            harbor_policy(),
            &l,
        );
        assert!(out.is_empty(), "{:?}", out);
    }

    #[test]
    fn test_unanchored_location_in_long_text() {
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        let text = "Mira waited by the window while the rain came down in long grey sheets and nothing else moved at all.";
        let out = run(text, harbor_policy(), &l);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule_id, "location_mentions.unanchored");
        assert_eq!(out[0].spans[0].start, 0);
        assert_eq!(out[0].spans[0].end, text.len());
    }

    #[test]
    fn test_unlisted_speaker_and_actor() {
        let mut policy = LintPolicy::default();
        policy.cast.insert("Theo".into(), vec![]);
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        let text = "\"We should go,\" Jonas said. Mira nodded. Theo stepped closer.\n\n\"Fine,\" said Jonas.";
        let out = run(text, policy, &l);
        let unlisted: Vec<&Violation> = out
            .iter()
            .filter(|v| v.rule_id == "character_presence.unlisted")
            .collect();
        assert_eq!(unlisted.len(), 2);
        let jonas = unlisted
            .iter()
            .find(|v| v.evidence == "Jonas")
            .expect("jonas flagged");
        assert_eq!(jonas.spans.len(), 2);
        assert_eq!(jonas.spans[0].start, 16);
        assert_eq!(jonas.message, "Jonas speaks or acts but is not listed as present");
        assert!(unlisted.iter().any(|v| v.evidence == "Theo"));
    }

    #[test]
    fn test_alias_of_listed_character_is_present() {
        let l = LedgerSnapshot::new("Library", "noon")
            .with_present(["Mira"])
            .with_alias("Captain", "Mira");
        let out = run("\"Enough,\" Captain said. Mira sighed.", LintPolicy::default(), &l);
        assert!(out.is_empty(), "{:?}", out);
    }

    #[test]
    fn test_full_name_of_listed_character_is_present() {
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        let out = run(
            "\"We should leave,\" Mira Vance said in the library.",
            LintPolicy::default(),
            &l,
        );
        assert!(out.is_empty(), "{:?}", out);

        let out = run(
            "\"We should leave,\" Jonas Vance said. Mira nodded in the library.",
            LintPolicy::default(),
            &l,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].evidence, "Jonas Vance");
    }

    #[test]
    fn test_location_alias_with_doubled_spaces_resolves() {
        let mut policy = LintPolicy::default();
        policy
            .locations
            .insert("Harbor".into(), vec!["the  old   docks".into()]);
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira"]);
        let out = run(
            "Mira shelved the last book in the library. The old docks smelled of tar.",
            policy,
            &l,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule_id, "location_mentions.unexpected");
        assert!(out[0].message.contains("Harbor"));
    }

    #[test]
    fn test_absent_characters_share_one_finding() {
        let l = LedgerSnapshot::new("Library", "noon").with_present(["Mira", "Jonas", "Staff"]);
        let out = run("The library was quiet.", LintPolicy::default(), &l);
        let absent: Vec<&Violation> = out
            .iter()
            .filter(|v| v.rule_id == "character_presence.absent")
            .collect();
        assert_eq!(absent.len(), 1);
        assert_eq!(
            absent[0].message,
            "Character 'Jonas', 'Mira' supposed present but not mentioned"
        );
        assert!(absent[0].context.is_empty());
    }

    #[test]
    fn test_first_person_narrator_need_not_be_named() {
        let policy = LintPolicy {
            pov: PovMode::First,
            ..LintPolicy::default()
        };
        let l = LedgerSnapshot::new("Library", "noon")
            .with_present(["Mira"])
            .with_pov_character("Mira");
        let out = run("I waited in the library.", policy, &l);
        assert!(out.is_empty(), "{:?}", out);
    }
}
