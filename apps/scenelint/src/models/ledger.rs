//! Continuity ledger snapshot and the character alias table built from it.
//!
//! The ledger is produced and mutated by external tooling between scenes; a
//! lint pass only reads it. Field aliases accept the older `state.yaml`
//! layout (`location_current`, `time_of_day`, `who_present`, ...).

use crate::error::LintError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Relationship descriptor between two characters. Order of `pair` is not significant.
pub struct Relationship {
    pub pair: [String; 2],
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Read-only continuity state for one lint pass.
pub struct LedgerSnapshot {
    #[serde(alias = "location_current")]
    pub location: String,
    #[serde(alias = "time_of_day")]
    pub time: String,
    #[serde(default, alias = "who_present")]
    pub characters_present: BTreeSet<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub scene_goal: String,
    #[serde(default, alias = "tone_profile")]
    pub tone: String,
    #[serde(default)]
    pub location_previous: Option<String>,
    #[serde(default, alias = "date_or_day_count")]
    pub day: Option<String>,
    #[serde(default, alias = "elapsed_time_since_last_scene")]
    pub elapsed_since_last_scene: Option<String>,
    #[serde(default)]
    pub pov_character: Option<String>,
    /// Surface form -> canonical character name.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl LedgerSnapshot {
    pub fn new(location: impl Into<String>, time: impl Into<String>) -> Self {
        LedgerSnapshot {
            location: location.into(),
            time: time.into(),
            ..Default::default()
        }
    }

    pub fn with_present<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.characters_present
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_pov_character(mut self, name: impl Into<String>) -> Self {
        self.pov_character = Some(name.into());
        self
    }

    pub fn with_alias(mut self, surface: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(surface.into(), canonical.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Check the fields every continuity check relies on.
    ///
    /// Optional fields are only validated when present.
    pub fn validate(&self) -> Result<(), LintError> {
        if self.location.trim().is_empty() {
            return Err(LintError::ledger("location", "must not be empty"));
        }
        if self.time.trim().is_empty() {
            return Err(LintError::ledger("time", "must not be empty"));
        }
        if self.characters_present.iter().any(|c| c.trim().is_empty()) {
            return Err(LintError::ledger(
                "characters_present",
                "contains an empty character name",
            ));
        }
        for (i, rel) in self.relationships.iter().enumerate() {
            if rel.pair.iter().any(|c| c.trim().is_empty()) {
                return Err(LintError::ledger(
                    format!("relationships[{}]", i),
                    "pair contains an empty character name",
                ));
            }
        }
        for (surface, canonical) in &self.aliases {
            if surface.trim().is_empty() || canonical.trim().is_empty() {
                return Err(LintError::ledger(
                    "aliases",
                    format!("alias '{}' -> '{}' has an empty side", surface, canonical),
                ));
            }
        }
        if let Some(pov) = &self.pov_character {
            if pov.trim().is_empty() {
                return Err(LintError::ledger("pov_character", "must not be empty when set"));
            }
        }
        Ok(())
    }
}

const PRONOUNS: &[&str] = &[
    "he", "him", "his", "she", "her", "hers", "they", "them", "their", "theirs", "i", "me", "my",
    "mine", "you", "your", "we", "us", "our",
];

pub(crate) fn is_pronoun(word: &str) -> bool {
    PRONOUNS.contains(&word.to_ascii_lowercase().as_str())
}

#[derive(Debug, Clone, Default)]
/// Surface form -> canonical character lookup for one pass.
///
/// Built from the cast in the policy, the ledger's own aliases, the present
/// list, relationship participants and the POV character. Pronoun aliases
/// are kept apart: they help POV resolution but never count as a mention.
pub struct AliasTable {
    names: BTreeMap<String, String>,
    pronouns: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn build(ledger: &LedgerSnapshot, cast: &BTreeMap<String, Vec<String>>) -> Self {
        let mut table = AliasTable::default();
        for (name, aliases) in cast {
            table.add(name, name);
            for alias in aliases {
                table.add(alias, name);
            }
        }
        for name in &ledger.characters_present {
            table.add(name, name);
        }
        for rel in &ledger.relationships {
            for name in &rel.pair {
                table.add(name, name);
            }
        }
        if let Some(pov) = &ledger.pov_character {
            table.add(pov, pov);
        }
        // Ledger aliases win over the configured cast.
        for (surface, canonical) in &ledger.aliases {
            table.add(canonical, canonical);
            table.add(surface, canonical);
        }
        table
    }

    fn add(&mut self, surface: &str, canonical: &str) {
        let surface = surface.trim();
        let canonical = canonical.trim();
        if surface.is_empty() || canonical.is_empty() {
            return;
        }
        let key = surface.to_lowercase();
        if is_pronoun(&key) {
            self.pronouns.insert(key, canonical.to_string());
        } else {
            self.names.insert(key, canonical.to_string());
        }
    }

    /// Resolve a name or nickname to its canonical character.
    pub fn resolve(&self, surface: &str) -> Option<&str> {
        self.names
            .get(&surface.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Canonical name for `surface`, falling back to the surface form itself.
    pub fn canonical_or<'a>(&'a self, surface: &'a str) -> &'a str {
        self.resolve(surface).unwrap_or(surface)
    }

    /// Non-pronoun surface forms, longest first so alternations prefer
    /// "Mira Vance" over "Mira".
    pub fn surface_forms(&self) -> Vec<&str> {
        let mut forms: Vec<&str> = self.names.keys().map(String::as_str).collect();
        forms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        forms
    }

    /// Pronouns declared as aliases of `canonical`.
    pub fn pronouns_for(&self, canonical: &str) -> Vec<&str> {
        self.pronouns
            .iter()
            .filter(|(_, c)| c.eq_ignore_ascii_case(canonical))
            .map(|(p, _)| p.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> LedgerSnapshot {
        LedgerSnapshot::new("Library", "afternoon").with_present(["Alice", "Bob"])
    }

    #[test]
    fn test_validate_names_the_missing_field() {
        let err = LedgerSnapshot::new("  ", "noon").validate().unwrap_err();
        assert_eq!(
            err,
            LintError::LedgerShape {
                field: "location".into(),
                reason: "must not be empty".into()
            }
        );
        let err = LedgerSnapshot::new("Library", "").validate().unwrap_err();
        assert!(matches!(err, LintError::LedgerShape { ref field, .. } if field == "time"));
        assert!(ledger().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_relationship_member() {
        let mut l = ledger();
        l.relationships.push(Relationship {
            pair: ["Alice".into(), " ".into()],
            descriptor: "rivals".into(),
        });
        let err = l.validate().unwrap_err();
        assert!(matches!(err, LintError::LedgerShape { ref field, .. } if field == "relationships[0]"));
    }

    #[test]
    fn test_legacy_state_fields_deserialize() {
        let l: LedgerSnapshot = serde_yaml::from_str(
            r#"
location_current: Library
time_of_day: afternoon
who_present: [Alice, Bob]
elapsed_time_since_last_scene: 30 minutes
tone_profile: hushed
"#,
        )
        .unwrap();
        assert_eq!(l.location, "Library");
        assert_eq!(l.time, "afternoon");
        assert!(l.characters_present.contains("Alice"));
        assert_eq!(l.elapsed_since_last_scene.as_deref(), Some("30 minutes"));
        assert_eq!(l.tone, "hushed");
    }

    #[test]
    fn test_alias_table_resolves_and_separates_pronouns() {
        let mut cast = BTreeMap::new();
        cast.insert("Jonas".to_string(), vec!["Jo".to_string()]);
        let l = ledger()
            .with_pov_character("Alice")
            .with_alias("Ally", "Alice")
            .with_alias("she", "Alice");
        let table = AliasTable::build(&l, &cast);
        assert_eq!(table.resolve("ally"), Some("Alice"));
        assert_eq!(table.resolve("JO"), Some("Jonas"));
        assert_eq!(table.resolve("she"), None);
        assert_eq!(table.pronouns_for("Alice"), vec!["she"]);
        assert_eq!(table.canonical_or("Jonas"), "Jonas");
        assert_eq!(table.canonical_or("Carol"), "Carol");
        let forms = table.surface_forms();
        assert!(forms.iter().position(|f| *f == "alice") < forms.iter().position(|f| *f == "jo"));
    }
}
