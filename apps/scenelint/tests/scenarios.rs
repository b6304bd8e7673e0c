use pretty_assertions::assert_eq;
use scenelint::config::{self, Overrides};
use scenelint::defaults::builtin_rules;
use scenelint::models::policy::PovMode;
use scenelint::{
    lint, run_lint, Category, LedgerSnapshot, LintPolicy, LintReport, Rule, RuleSet, Severity,
};
use std::collections::BTreeSet;
use std::fs;
use tempfile::tempdir;

const BUSY_SCENE: &str = "Mira read in the library. The stars glittered overhead.\n\n\
Suddenly, without warning, the reader would learn the truth of this story. \
\"We should leave,\" Jonas said. You could feel the tension build.";

fn ledger() -> LedgerSnapshot {
    LedgerSnapshot::new("Library", "morning").with_present(["Mira"])
}

fn banned(pattern: &str, n: usize) -> Rule {
    Rule::regex(
        format!("banned_phrases.banned.{}", n),
        Category::BannedPhrases,
        Severity::Error,
        pattern,
        "Banned: {match}",
    )
}

fn with_banned(extra: Vec<Rule>) -> RuleSet {
    let mut rules = builtin_rules();
    rules.extend(extra);
    RuleSet::compile(rules, LintPolicy::default())
}

fn in_category(report: &LintReport, category: Category) -> Vec<&scenelint::Violation> {
    report
        .violations
        .iter()
        .filter(|v| v.category == category)
        .collect()
}

#[test]
fn test_banned_phrase_is_one_error() {
    let rules = with_banned(vec![banned("suddenly, without warning", 0)]);
    let report = lint(
        "Mira read in the library. Suddenly, without warning, the lamp went out.",
        &rules,
        &ledger(),
    )
    .unwrap();
    let found = in_category(&report, Category::BannedPhrases);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].severity, Severity::Error);
    assert!(found[0].evidence.eq_ignore_ascii_case("suddenly, without warning"));
    assert_eq!(found[0].message, "Banned: Suddenly, without warning");
    assert_eq!(
        found[0].context,
        "Mira read in the library. Suddenly, without warning, the lamp went out."
    );
}

#[test]
fn test_unlisted_speaker_is_one_error() {
    let rules = RuleSet::builtin(LintPolicy::default());
    let report = lint(
        "Mira read in the library. \"We should leave,\" Jonas said.",
        &rules,
        &ledger(),
    )
    .unwrap();
    let found = in_category(&report, Category::CharacterPresence);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].severity, Severity::Error);
    assert_eq!(found[0].evidence, "Jonas");
    assert!(found[0].message.contains("Jonas"));
}

#[test]
fn test_night_marker_against_morning_ledger() {
    let rules = RuleSet::builtin(LintPolicy::default());
    let report = lint(
        "Mira read in the library while the stars glittered overhead.",
        &rules,
        &ledger(),
    )
    .unwrap();
    let found = in_category(&report, Category::TimelineConsistency);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].evidence, "stars");
    assert!(found[0].message.contains("night"));
    assert!(found[0].message.contains("morning"));
}

#[test]
fn test_time_markers_after_a_scene_transition_pass() {
    let rules = RuleSet::builtin(LintPolicy::default());
    for text in [
        "Mira read in the library. Hours later, the stars glittered overhead.",
        "Mira read in the library.\n\n***\n\nThe stars glittered overhead.",
    ] {
        let report = lint(text, &rules, &ledger()).unwrap();
        let found = in_category(&report, Category::TimelineConsistency);
        assert!(found.is_empty(), "{:#?}", found);
    }
}

#[test]
fn test_third_person_pronoun_for_first_person_narrator() {
    let policy = LintPolicy {
        pov: PovMode::First,
        ..LintPolicy::default()
    };
    let rules = RuleSet::builtin(policy);
    let l = ledger().with_pov_character("Mira");
    let report = lint(
        "I waited in the library. Mira turned and she left.",
        &rules,
        &l,
    )
    .unwrap();
    let found = in_category(&report, Category::PovAddress);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].rule_id, "pov_address.pov_third_person");
    assert_eq!(found[0].evidence, "she");
}

#[test]
fn test_malformed_rule_is_skipped_with_diagnostic() {
    let rules = with_banned(vec![
        banned("(unclosed", 0),
        banned("suddenly, without warning", 1),
    ]);
    let report = lint(
        "Mira read in the library. Suddenly, without warning, the lamp went out.",
        &rules,
        &ledger(),
    )
    .unwrap();
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].rule_id, "banned_phrases.banned.0");
    let found = in_category(&report, Category::BannedPhrases);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].rule_id, "banned_phrases.banned.1");
}

#[test]
fn test_clean_scene_has_empty_report() {
    let rules = RuleSet::builtin(LintPolicy::default());
    let report = lint("Mira read in the library.", &rules, &ledger()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.error_count, 0);
    assert_eq!(report.warning_count, 0);
}

#[test]
fn test_lint_is_deterministic() {
    let rules = with_banned(vec![banned("suddenly, without warning", 0)]);
    let first = lint(BUSY_SCENE, &rules, &ledger()).unwrap();
    let second = lint(BUSY_SCENE, &rules, &ledger()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert!(first.violations.len() >= 5, "{:#?}", first.violations);
}

#[test]
fn test_report_is_ordered_and_free_of_duplicates() {
    let rules = with_banned(vec![banned("suddenly, without warning", 0)]);
    let report = lint(BUSY_SCENE, &rules, &ledger()).unwrap();
    for pair in report.violations.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ka = (a.category, a.severity, a.start());
        let kb = (b.category, b.severity, b.start());
        assert!(ka <= kb, "{:?} after {:?}", kb, ka);
    }
    let keys: BTreeSet<(String, Vec<scenelint::TextSpan>)> = report
        .violations
        .iter()
        .map(|v| (v.rule_id.clone(), v.spans.clone()))
        .collect();
    assert_eq!(keys.len(), report.violations.len());
    let errors = report
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    assert_eq!(report.error_count, errors);
    assert_eq!(report.warning_count, report.violations.len() - errors);
}

#[test]
fn test_removing_a_rule_only_removes_its_findings() {
    let extra = || vec![banned("suddenly, without warning", 0)];
    let full = lint(BUSY_SCENE, &with_banned(extra()), &ledger()).unwrap();
    let fired: BTreeSet<String> = full.violations.iter().map(|v| v.rule_id.clone()).collect();
    assert!(fired.len() >= 4, "{:?}", fired);
    for id in &fired {
        let mut rules = builtin_rules();
        rules.extend(extra());
        rules.retain(|r| &r.id != id);
        let reduced = lint(
            BUSY_SCENE,
            &RuleSet::compile(rules, LintPolicy::default()),
            &ledger(),
        )
        .unwrap();
        assert!(reduced.violations.iter().all(|v| &v.rule_id != id));
        for v in &reduced.violations {
            assert!(full.violations.contains(v), "{} appeared after removing {}", v.rule_id, id);
        }
        assert!(reduced.violations.len() < full.violations.len());
    }
}

#[test]
fn test_project_files_end_to_end() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("scenes")).unwrap();
    fs::write(
        root.join("scenelint.toml"),
        "ledger = \"ledger.yaml\"\nbanned_phrases = \"banned_phrases.yaml\"\n",
    )
    .unwrap();
    fs::write(
        root.join("ledger.yaml"),
        "location_current: Library\ntime_of_day: morning\nwho_present: [Mira]\n",
    )
    .unwrap();
    fs::write(
        root.join("banned_phrases.yaml"),
        "banned_regex:\n  - \"suddenly, without warning\"\n  - \"(unclosed\"\n",
    )
    .unwrap();
    fs::write(root.join("scenes/01.md"), "Mira read in the library.").unwrap();
    fs::write(
        root.join("scenes/02.md"),
        "Mira read in the library. Suddenly, without warning, the stars came out.",
    )
    .unwrap();

    let eff = config::resolve_effective(&Overrides {
        root: root.to_str().map(str::to_string),
        ..Overrides::default()
    })
    .unwrap();
    let rules = config::assemble_rule_set(&eff).unwrap();
    assert_eq!(rules.diagnostics().len(), 1);
    let snapshot = config::load_ledger(eff.ledger.as_deref().unwrap()).unwrap();
    let paths = scenelint::lint::expand_patterns(&eff.root, &eff.files).unwrap();
    let result = run_lint(&paths, &eff.root, &rules, &snapshot);

    assert_eq!(result.summary.files, 2);
    assert_eq!(result.summary.failed, 0);
    assert_eq!(result.files[0].file, "scenes/01.md");
    assert!(result.files[0].report.as_ref().unwrap().is_clean());
    let second = result.files[1].report.as_ref().unwrap();
    let ids: Vec<&str> = second.violations.iter().map(|v| v.rule_id.as_str()).collect();
    assert!(ids.contains(&"banned_phrases.banned.0"));
    assert!(ids.contains(&"timeline_consistency.time_of_day"));
    assert_eq!(result.summary.errors, second.error_count);
}
