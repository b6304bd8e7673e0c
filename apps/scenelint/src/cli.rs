//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scenelint",
    version,
    about = "Style and continuity linter for fiction scenes",
    long_about = "scenelint — check scene drafts against style rules and a continuity ledger.\n\nConfiguration precedence: CLI > scenelint.toml > defaults.",
    after_help = "Examples:\n  scenelint lint --ledger state/ledger.yaml scenes/ch01/*.md\n  scenelint lint --output json --strict\n  scenelint rules --style-rules rules/style_rules.yaml",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current scenelint version."
    )]
    Version,
    /// Lint scene files
    #[command(
        about = "Run lint checks",
        long_about = "Lint scene files against style rules, banned phrases and the continuity ledger. Errors fail the run; warnings fail it only with --strict.",
        after_help = "Examples:\n  scenelint lint --ledger ledger.yaml scenes/01.md\n  scenelint lint --pov first --output markdown\n  scenelint lint --output notes scenes/ch02/*.md"
    )]
    Lint {
        #[arg(help = "Scene files or glob patterns (default: from config, else scenes/**/*.md)")]
        files: Vec<String>,
        #[arg(long, help = "Project root (default: detected from current dir)")]
        root: Option<String>,
        #[arg(long, help = "Ledger snapshot file (yaml|json|toml)")]
        ledger: Option<String>,
        #[arg(long, help = "Style rules file")]
        style_rules: Option<String>,
        #[arg(long = "banned", help = "Banned phrases file")]
        banned_phrases: Option<String>,
        #[arg(long, help = "Output mode: human|json|markdown|notes (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Narrative POV: first|second|third")]
        pov: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Treat warnings as failures")]
        strict: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Skip the built-in rule catalogue")]
        no_builtin: bool,
    },
    /// List the effective rule set
    #[command(
        about = "List rules",
        long_about = "Print every rule the effective configuration would run, grouped by category, plus any rule that failed to compile."
    )]
    Rules {
        #[arg(long, help = "Project root (default: detected from current dir)")]
        root: Option<String>,
        #[arg(long, help = "Style rules file")]
        style_rules: Option<String>,
        #[arg(long = "banned", help = "Banned phrases file")]
        banned_phrases: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Skip the built-in rule catalogue")]
        no_builtin: bool,
    },
}
