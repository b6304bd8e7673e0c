//! Configuration discovery, effective settings, and file loaders.
//!
//! scenelint reads `scenelint.toml|yaml|yml` from the project root (or the
//! closest ancestor) and merges it with CLI flags into an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `files`: `["scenes/**/*.md"]`
//! - `rules.builtin`: true
//! - `policy`: `LintPolicy::default()`
//!
//! Overrides precedence: CLI > config file > defaults.
//!
//! Rule and ledger files are YAML unless their extension says `.json` or
//! `.toml`.

use crate::error::{ConfigError, ConfigResult};
use crate::models::ledger::LedgerSnapshot;
use crate::models::policy::{LintPolicy, PovMode};
use crate::models::rulefile::{BannedPhrasesFile, StyleRulesFile};
use crate::models::rules::Rule;
use crate::models::Severity;
use crate::rules::RuleSet;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILES: [&str; 3] = ["scenelint.toml", "scenelint.yaml", "scenelint.yml"];
const DEFAULT_FILES: &str = "scenes/**/*.md";

#[derive(Debug, Default, Deserialize, Clone)]
/// Rule selection under `[rules]`.
pub struct RulesCfg {
    /// Include the built-in rule set (default true).
    pub builtin: Option<bool>,
    /// Rule ids to drop. An entry without a dot drops the whole category
    /// (`"editorializing"` drops `editorializing.*`).
    #[serde(default)]
    pub disable: Vec<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `scenelint.toml|yaml`.
pub struct ScenelintConfig {
    pub ledger: Option<String>,
    pub style_rules: Option<String>,
    pub banned_phrases: Option<String>,
    pub output: Option<String>,
    pub pov: Option<String>,
    pub strict: Option<bool>,
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub rules: RulesCfg,
    #[serde(default)]
    pub policy: Option<LintPolicy>,
}

#[derive(Debug, Default, Clone)]
/// CLI-provided values; `None` defers to the config file.
pub struct Overrides {
    pub root: Option<String>,
    pub ledger: Option<String>,
    pub style_rules: Option<String>,
    pub banned_phrases: Option<String>,
    pub output: Option<String>,
    pub pov: Option<String>,
    pub strict: Option<bool>,
    pub no_builtin: bool,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_found: bool,
    pub ledger: Option<PathBuf>,
    pub style_rules: Option<PathBuf>,
    pub banned_phrases: Option<PathBuf>,
    pub output: String,
    pub strict: bool,
    pub files: Vec<String>,
    pub builtin: bool,
    pub disable: Vec<String>,
    pub severity: BTreeMap<String, Severity>,
    pub policy: LintPolicy,
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `scenelint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `ScenelintConfig` from the first config file present in `root`.
pub fn load_config(root: &Path) -> ConfigResult<Option<ScenelintConfig>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if path.exists() {
            return read_structured(&path).map(Some);
        }
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI values, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides) -> ConfigResult<Effective> {
    let start = PathBuf::from(cli.root.as_deref().unwrap_or("."));
    let root = detect_root(&start);
    let loaded = load_config(&root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let at_root = |p: String| root.join(p);
    let ledger = cli.ledger.clone().or(cfg.ledger).map(at_root);
    let style_rules = cli.style_rules.clone().or(cfg.style_rules).map(at_root);
    let banned_phrases = cli.banned_phrases.clone().or(cfg.banned_phrases).map(at_root);

    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let strict = cli.strict.or(cfg.strict).unwrap_or(false);
    let files = if !cli.files.is_empty() {
        cli.files.clone()
    } else {
        cfg.files
            .unwrap_or_else(|| vec![DEFAULT_FILES.to_string()])
    };

    let mut policy = cfg.policy.unwrap_or_default();
    if let Some(raw) = cli.pov.as_deref().or(cfg.pov.as_deref()) {
        policy.pov = PovMode::parse(raw).ok_or_else(|| ConfigError::Parse {
            path: root.clone(),
            message: format!("unknown pov mode '{}' (expected first|second|third)", raw),
        })?;
    }
    let builtin = !cli.no_builtin && cfg.rules.builtin.unwrap_or(true);

    Ok(Effective {
        root,
        config_found,
        ledger,
        style_rules,
        banned_phrases,
        output,
        strict,
        files,
        builtin,
        disable: cfg.rules.disable,
        severity: cfg.rules.severity,
        policy,
    })
}

/// Deserialize a YAML, JSON or TOML file chosen by extension.
pub fn read_structured<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string())),
        Some("toml") => toml::from_str(&text).map_err(|e| parse_err(e.to_string())),
        _ => serde_yaml::from_str(&text).map_err(|e| parse_err(e.to_string())),
    }
}

/// Style rules from `style_rules.yaml`. A missing file contributes nothing.
pub fn load_style_rules(path: &Path) -> ConfigResult<Vec<Rule>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no style rules file");
        return Ok(Vec::new());
    }
    read_structured::<StyleRulesFile>(path)?.into_rules()
}

/// Banned and caution phrases. A missing file contributes nothing.
pub fn load_banned_phrases(path: &Path) -> ConfigResult<Vec<Rule>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no banned phrases file");
        return Ok(Vec::new());
    }
    Ok(read_structured::<BannedPhrasesFile>(path)?.into_rules())
}

pub fn load_ledger(path: &Path) -> ConfigResult<LedgerSnapshot> {
    read_structured(path)
}

fn disabled(id: &str, disable: &[String]) -> bool {
    disable.iter().any(|d| {
        id == d || (!d.contains('.') && id.strip_prefix(d.as_str()).is_some_and(|r| r.starts_with('.')))
    })
}

/// Build the rule set the effective config describes: built-ins, then style
/// rules, then banned phrases, minus disabled ids, with severity overrides
/// applied.
pub fn assemble_rule_set(eff: &Effective) -> ConfigResult<RuleSet> {
    let mut rules: Vec<Rule> = Vec::new();
    if eff.builtin {
        rules.extend(crate::defaults::builtin_rules());
    }
    if let Some(p) = eff.style_rules.as_deref() {
        rules.extend(load_style_rules(p)?);
    }
    if let Some(p) = eff.banned_phrases.as_deref() {
        rules.extend(load_banned_phrases(p)?);
    }
    let before = rules.len();
    rules.retain(|r| !disabled(&r.id, &eff.disable));
    if rules.len() < before {
        tracing::debug!(dropped = before - rules.len(), "rules disabled by config");
    }
    let rules = rules
        .into_iter()
        .map(|r| match eff.severity.get(&r.id) {
            Some(sev) => r.with_severity(*sev),
            None => r,
        })
        .collect();
    Ok(RuleSet::compile(rules, eff.policy.clone()))
}
