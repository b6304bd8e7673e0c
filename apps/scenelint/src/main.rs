//! scenelint CLI binary entry point.
//! Resolves configuration, runs the lint pass and prints results.

use clap::Parser;
use scenelint::cli::{Cli, Commands};
use scenelint::config::{self, Effective, Overrides};
use scenelint::models::rules::Rule;
use scenelint::rules::RuleSet;
use scenelint::{lint, output, utils};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCENELINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", utils::error_prefix(), msg);
    process::exit(2);
}

fn effective(ov: &Overrides) -> Effective {
    let eff = config::resolve_effective(ov).unwrap_or_else(|e| fail(e));
    if !eff.config_found {
        eprintln!(
            "{} No scenelint.toml found; using defaults.",
            utils::note_prefix()
        );
    }
    eff
}

fn rule_set(eff: &Effective) -> RuleSet {
    let set = config::assemble_rule_set(eff).unwrap_or_else(|e| fail(e));
    for d in set.diagnostics() {
        tracing::warn!(rule = %d.rule_id, "{}", d.message);
    }
    set
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Lint {
            files,
            root,
            ledger,
            style_rules,
            banned_phrases,
            output,
            pov,
            strict,
            no_builtin,
        } => {
            let eff = effective(&Overrides {
                root,
                ledger,
                style_rules,
                banned_phrases,
                output,
                pov,
                strict: if strict { Some(true) } else { None },
                no_builtin,
                files,
            });
            // The ledger has no default location.
            let Some(ledger_path) = eff.ledger.as_deref() else {
                fail("Ledger is not configured. Pass --ledger or add scenelint.toml.");
            };
            if !ledger_path.is_file() {
                fail(format!(
                    "Ledger file not found: {} (pass --ledger or configure scenelint.toml)",
                    ledger_path.display()
                ));
            }
            let snapshot = config::load_ledger(ledger_path).unwrap_or_else(|e| fail(e));
            if let Err(e) = snapshot.validate() {
                fail(e);
            }
            let set = rule_set(&eff);

            let paths = lint::expand_patterns(&eff.root, &eff.files).unwrap_or_else(|e| fail(e));
            if paths.is_empty() {
                if eff.output != "json" {
                    eprintln!(
                        "{} No scene files matched [{}]",
                        utils::info_prefix(),
                        eff.files.join(", ")
                    );
                }
            } else {
                tracing::info!(files = paths.len(), rules = set.len(), "linting scenes");
            }
            let result = lint::run_lint(&paths, &eff.root, &set, &snapshot);
            output::print_lint(&result, &eff.output);
            if result.summary.failed > 0 {
                process::exit(2);
            }
            if result.summary.errors > 0 || (eff.strict && result.summary.warnings > 0) {
                process::exit(1);
            }
        }
        Commands::Rules {
            root,
            style_rules,
            banned_phrases,
            no_builtin,
        } => {
            let eff = effective(&Overrides {
                root,
                style_rules,
                banned_phrases,
                no_builtin,
                ..Overrides::default()
            });
            let set = rule_set(&eff);
            let mut rules: Vec<&Rule> = set.rules().iter().map(|c| &c.rule).collect();
            rules.sort_by(|a, b| a.category.cmp(&b.category).then(a.id.cmp(&b.id)));
            let color = utils::colors_enabled();
            print!("{}", output::render_rule_list(&rules, color));
            for d in set.diagnostics() {
                println!("  ◆ skipped ❲{}❳ — {}", d.rule_id, d.message);
            }
        }
    }
}
