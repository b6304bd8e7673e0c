//! Lint policy: thresholds and lexicons used by the structural checks.
//!
//! Key components:
//! - `pov`: Declared point-of-view person for the scene.
//! - `dedupe`: Window inside which repeated matches of one rule collapse.
//! - Thresholds for dialogue exposition, anthropomorphism, timeline drift.
//! - Lexicons (judgment words, inanimate nouns, animate verbs, speech and
//!   perception verbs, transition phrases) and entity tables (`locations`,
//!   `cast`).
//!
//! Every field has a default, so `[policy]` in the project config only needs
//! to name what it overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Grammatical person the narration is written in.
pub enum PovMode {
    First,
    Second,
    #[default]
    Third,
}

impl PovMode {
    pub fn parse(s: &str) -> Option<PovMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "1" | "1st" => Some(PovMode::First),
            "second" | "2" | "2nd" => Some(PovMode::Second),
            "third" | "3" | "3rd" => Some(PovMode::Third),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Repeated matches of the same rule inside one window are reported once.
pub enum DedupeWindow {
    #[default]
    Sentence,
    /// Suppress a match starting within N words of the previous kept match.
    Tokens(usize),
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Root policy. Loaded from `[policy]` in `scenelint.toml|yaml`.
pub struct LintPolicy {
    pub pov: PovMode,
    pub dedupe: DedupeWindow,
    /// Dialogue spans longer than this many words need interaction markers.
    pub dialogue_max_words: usize,
    /// Consecutive dialogue lines above this count form a monologue block.
    pub dialogue_block_lines: usize,
    /// Words allowed between an inanimate noun and an animate verb.
    pub anthropomorphism_gap: usize,
    /// Phases a time marker may sit away from the ledger time.
    pub time_tolerance: u8,
    /// Durations above `elapsed_since_last_scene * factor` are flagged.
    pub elapsed_slack_factor: u32,
    /// Texts shorter than this are not required to name their location.
    pub location_anchor_min_chars: usize,
    pub judgment_lexicon: Vec<String>,
    pub inanimate_nouns: Vec<String>,
    pub animate_verbs: Vec<String>,
    pub interaction_markers: Vec<String>,
    pub speech_verbs: Vec<String>,
    pub perception_verbs: Vec<String>,
    pub transition_phrases: Vec<String>,
    /// Present-list entries that never need to be named (e.g. "staff").
    pub generic_roles: Vec<String>,
    /// Known locations: canonical name -> aliases.
    pub locations: BTreeMap<String, Vec<String>>,
    /// Known characters: canonical name -> aliases.
    pub cast: BTreeMap<String, Vec<String>>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for LintPolicy {
    fn default() -> Self {
        LintPolicy {
            pov: PovMode::Third,
            dedupe: DedupeWindow::Sentence,
            dialogue_max_words: 60,
            dialogue_block_lines: 10,
            anthropomorphism_gap: 3,
            time_tolerance: 1,
            elapsed_slack_factor: 3,
            location_anchor_min_chars: 100,
            judgment_lexicon: words(&[
                "thankfully",
                "sadly",
                "unfortunately",
                "fortunately",
                "obviously",
                "clearly",
                "tragically",
                "mercifully",
                "shamefully",
                "pathetic",
                "admirable",
                "shameful",
                "foolish",
                "heroic",
                "noble",
                "disgraceful",
            ]),
            inanimate_nouns: words(&[
                "silence",
                "room",
                "light",
                "table",
                "chair",
                "desk",
                "painting",
                "photo",
                "box",
                "door",
                "window",
                "ventilation",
                "shoes",
                "clock",
                "mirror",
                "wall",
                "walls",
                "floor",
                "ceiling",
                "air",
                "space",
                "shadows",
                "fabric",
                "glass",
                "marble",
                "stone",
                "wood",
            ]),
            animate_verbs: words(&[
                "watches",
                "watched",
                "listens",
                "listened",
                "hears",
                "heard",
                "sees",
                "saw",
                "knows",
                "knew",
                "remembers",
                "remembered",
                "judges",
                "judged",
                "accuses",
                "accused",
                "demands",
                "demanded",
                "mirrors",
                "mirrored",
                "echoes",
                "echoed",
                "whispers",
                "whispered",
                "breathes",
                "breathed",
                "embraces",
                "embraced",
                "waits",
                "waited",
            ]),
            interaction_markers: words(&[
                "hey", "listen", "look", "okay", "right", "well", "wait", "please", "huh",
            ]),
            speech_verbs: words(&[
                "said",
                "says",
                "asked",
                "asks",
                "replied",
                "whispered",
                "shouted",
                "muttered",
                "murmured",
                "called",
                "answered",
                "snapped",
                "added",
                "continued",
                "cried",
                "yelled",
                "hissed",
                "breathed",
                "told",
            ]),
            perception_verbs: words(&[
                "felt",
                "thought",
                "wondered",
                "realized",
                "realised",
                "knew",
                "sensed",
                "noticed",
                "remembered",
                "feared",
                "hoped",
                "suspected",
            ]),
            transition_phrases: words(&[
                "later that",
                "hours later",
                "the next day",
                "the next morning",
                "by the time",
                "meanwhile",
                "arrived at",
                "walked to",
                "drove to",
                "headed to",
                "back at",
                "returned to",
                "travelled to",
                "traveled to",
            ]),
            generic_roles: words(&["aide", "assistant", "staff", "attendant"]),
            locations: BTreeMap::new(),
            cast: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_policy_keeps_defaults() {
        let p: LintPolicy = toml::from_str(
            r#"
pov = "first"
dialogue_max_words = 40
dedupe = { tokens = 8 }
[cast]
Mira = ["Mir", "the captain"]
"#,
        )
        .unwrap();
        assert_eq!(p.pov, PovMode::First);
        assert_eq!(p.dialogue_max_words, 40);
        assert_eq!(p.dedupe, DedupeWindow::Tokens(8));
        assert_eq!(p.dialogue_block_lines, 10);
        assert!(p.speech_verbs.iter().any(|v| v == "said"));
        assert_eq!(p.cast["Mira"].len(), 2);
    }

    #[test]
    fn test_pov_mode_parse() {
        assert_eq!(PovMode::parse("1st"), Some(PovMode::First));
        assert_eq!(PovMode::parse("Third"), Some(PovMode::Third));
        assert_eq!(PovMode::parse("omniscient"), None);
    }
}
