//! Built-in rules.
//!
//! Regex rules for scene containment, meta-narrative, editorializing and POV
//! typing, plus one rule per structural predicate. Banned and caution
//! phrases have no built-ins; they come from `banned_phrases.yaml`.

use crate::models::rules::{Rule, RuleScope, Structural};
use crate::models::{Category, Severity};

fn hard(id: &str, category: Category, pattern: &str, message: &str) -> Rule {
    Rule::regex(id, category, Severity::Error, pattern, message).with_scope(RuleScope::Narration)
}

fn soft(id: &str, category: Category, pattern: &str, message: &str) -> Rule {
    Rule::regex(id, category, Severity::Warning, pattern, message)
        .with_scope(RuleScope::Narration)
}

pub fn builtin_rules() -> Vec<Rule> {
    use Category::*;
    vec![
        // scene containment
        hard(
            "scene_containment.flashback",
            SceneContainment,
            r"\bflash(?:back|ing\s+back)\b",
            "Flashback breaks scene containment",
        ),
        hard(
            "scene_containment.reverie",
            SceneContainment,
            r"\b(?:lost\s+in|drifted\s+into|in\s+a)\s+(?:memory|reverie)\b",
            "Memory insertion breaks scene containment",
        ),
        hard(
            "scene_containment.backstory",
            SceneContainment,
            r"\b(?:years?|months?|weeks?)\s+(?:ago|before|earlier)\b",
            "Backstory exposition; stay in the present moment",
        ),
        hard(
            "scene_containment.character_history",
            SceneContainment,
            r"\b(?:he|she|they)\s+had\s+(?:once|always)\s+been\b",
            "Character history insertion; keep to the present moment",
        ),
        hard(
            "scene_containment.past_summary",
            SceneContainment,
            r"\bback\s+(?:when|then),?\s+(?:she|he|they)\s+(?:had|was|were|did)\b",
            "Past event summary mid-scene",
        ),
        hard(
            "scene_containment.foreshadowing",
            SceneContainment,
            r"\b(?:little\s+did\s+(?:she|he|they)\s+know|(?:she|he|they)\s+would\s+(?:later|soon)\s+(?:learn|discover|realize|regret)|years\s+later)\b",
            "Forward reference reveals knowledge outside the scene: {match}",
        ),
        // meta-narrative
        hard(
            "meta_narrative.reader",
            MetaNarrative,
            r"\b(?:the|dear|gentle)\s+reader\b",
            "Meta-narrative: direct reference to the reader",
        ),
        hard(
            "meta_narrative.story_reference",
            MetaNarrative,
            r"\b(?:this|our)\s+(?:story|narrative|tale)\b",
            "Meta-narrative: story self-reference",
        ),
        hard(
            "meta_narrative.author",
            MetaNarrative,
            r"\b(?:authorial\s+(?:intent|voice)|as\s+the\s+author)\b",
            "Meta-narrative: author intrusion",
        ),
        hard(
            "meta_narrative.tension_mechanics",
            MetaNarrative,
            r"\b(?:build|escalate|heighten|deepen)(?:s|ed|ing)?\s+(?:the\s+)?tension\b",
            "Narrative explanation: tension mechanics named",
        ),
        hard(
            "meta_narrative.mood_label",
            MetaNarrative,
            r"\bthe\s+(?:mood|atmosphere)\s+(?:shifts|shifted|changes|changed|deepens|deepened|grows|grew)\b",
            "Narrative explanation: mood shift labelled",
        ),
        hard(
            "meta_narrative.explaining_action",
            MetaNarrative,
            r"\b(?:this|that|it)\s+(?:would|could|should)\s+(?:reveal|show|prove|demonstrate)\b",
            "Narrative explanation: explaining what an action means",
        ),
        // pov / address
        Rule::structural(
            "pov_address.second_person",
            Structural::SecondPersonNarration,
            Severity::Error,
            "Second-person pronoun '{match}' in narration",
        ),
        Rule::structural(
            "pov_address.first_person",
            Structural::FirstPersonNarration,
            Severity::Error,
            "First-person pronoun '{match}' in narration",
        ),
        Rule::structural(
            "pov_address.pov_third_person",
            Structural::PovThirdPerson,
            Severity::Error,
            "Third-person pronoun '{match}' refers to POV character {name} in first-person narration",
        ),
        // editorializing
        hard(
            "editorializing.won",
            Editorializing,
            r"\bwon\s+(?:her\s+over|him\s+over|them\s+over|the\s+day|control|the\s+upper\s+hand|the\s+argument)\b",
            "Relational outcome named: '{match}'",
        ),
        hard(
            "editorializing.abstract_state",
            Editorializing,
            r"\b(?:victory|triumph|surrender|submission|dominance|defeat|conquest)\b",
            "Abstract state named; show behaviour instead",
        ),
        hard(
            "editorializing.outcome",
            Editorializing,
            r"\b(?:he|she|they)\s+had\s+(?:won|conquered|captured|claimed)\b",
            "Relational outcome named",
        ),
        hard(
            "editorializing.state_named",
            Editorializing,
            r"\b(?:was|is|were)\s+(?:victorious|triumphant|defeated|conquered)\b",
            "State named; avoid diagnosis",
        ),
        hard(
            "editorializing.explaining",
            Editorializing,
            r"\bthis\s+(?:revealed|showed|proved|demonstrated)\s+(?:that|her|his|the)\b",
            "Narrative explanation: explaining meaning",
        ),
        hard(
            "editorializing.diagnosis",
            Editorializing,
            r"\bin\s+(?:this|that)\s+(?:moment|instant),?\s+(?:she|he|they)\s+(?:understood|realized|realised|knew)\b",
            "Diagnosis line: realizing/understanding",
        ),
        Rule::structural(
            "editorializing.judgment",
            Structural::JudgmentLexicon,
            Severity::Warning,
            "Narratorial judgment: '{match}'",
        ),
        // object anthropomorphism
        Rule::structural(
            "object_anthropomorphism.animate_verb",
            Structural::Anthropomorphism,
            Severity::Warning,
            "Object anthropomorphism: '{noun}' + '{verb}'",
        ),
        // dialogue exposition
        Rule::structural(
            "dialogue_exposition.monologue",
            Structural::DialogueMonologue,
            Severity::Warning,
            "Dialogue runs {count} words with no interaction; likely exposition",
        )
        .with_scope(RuleScope::Dialogue),
        Rule::structural(
            "dialogue_exposition.long_block",
            Structural::DialogueBlock,
            Severity::Warning,
            "Long dialogue block ({count} lines): consider breaking up",
        )
        .with_scope(RuleScope::Dialogue),
        // pov consistency
        soft(
            "pov_consistency.character_typing",
            PovConsistency,
            r"\b(?:she|he)\s+was\s+the\s+type\s+(?:of|to)\b",
            "Character summary/typing breaks POV",
        ),
        soft(
            "pov_consistency.character_summary",
            PovConsistency,
            r"\b(?:in|by)\s+(?:her|his)\s+(?:nature|character)\b",
            "Character summary breaks POV",
        ),
        soft(
            "pov_consistency.habitual_summary",
            PovConsistency,
            r"\b(?:like|as)\s+(?:she|he)\s+(?:always|usually|often)\s+(?:did|was)\b",
            "Habitual summary breaks POV",
        ),
        soft(
            "pov_consistency.never_one_to",
            PovConsistency,
            r"\b(?:she|he)\s+(?:had\s+)?(?:never|always)\s+(?:been\s+)?one\s+to\b",
            "Character typing breaks POV",
        ),
        Rule::structural(
            "pov_consistency.anchor_drift",
            Structural::PovAnchorDrift,
            Severity::Warning,
            "POV drift: perceptual anchor for {name} while the POV belongs to {expected}",
        ),
        // location mentions
        Rule::structural(
            "location_mentions.unexpected",
            Structural::LocationMention,
            Severity::Warning,
            "Mentions {found} but the scene is set in {expected}, with no transition",
        ),
        Rule::structural(
            "location_mentions.unanchored",
            Structural::LocationUnanchored,
            Severity::Warning,
            "Current location '{expected}' not mentioned in text",
        ),
        // character presence
        Rule::structural(
            "character_presence.unlisted",
            Structural::UnlistedCharacter,
            Severity::Error,
            "{name} speaks or acts but is not listed as present",
        ),
        Rule::structural(
            "character_presence.absent",
            Structural::AbsentCharacter,
            Severity::Warning,
            "Character '{name}' supposed present but not mentioned",
        ),
        // timeline
        Rule::structural(
            "timeline_consistency.time_of_day",
            Structural::TimeOfDay,
            Severity::Error,
            "Time marker '{match}' ({found}) contradicts ledger time '{expected}'",
        ),
        Rule::structural(
            "timeline_consistency.elapsed_bound",
            Structural::ElapsedBound,
            Severity::Error,
            "Elapsed time '{match}' exceeds constraint '{expected}'",
        ),
        Rule::structural(
            "timeline_consistency.elapsed_since_last_scene",
            Structural::ElapsedSinceLastScene,
            Severity::Warning,
            "Time reference '{match}' may exceed elapsed time ({expected})",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_builtin_ids_are_unique_and_prefixed_by_category() {
        let rules = builtin_rules();
        let ids: BTreeSet<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
        for r in &rules {
            assert!(
                r.id.starts_with(r.category.as_str()),
                "{} not under {}",
                r.id,
                r.category
            );
        }
    }
}
