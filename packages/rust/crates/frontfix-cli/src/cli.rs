use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "frontfix",
    about = "Batch rewrites and audits for Twig templates, stylesheets and translation files",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Config file (default: frontfix.yaml in the working directory, if present).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub(crate) output: OutputFormat,

    /// Debug logging on stderr (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// File set selection shared by tree-walking commands.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ScanArgs {
    /// Directory to scan (default: templates).
    #[arg(long, value_name = "DIR")]
    pub(crate) root: Option<PathBuf>,

    /// Accepted file suffix, e.g. `.twig` or `.de.yaml` (repeatable).
    #[arg(long = "ext", value_name = "EXT")]
    pub(crate) extensions: Vec<String>,

    /// Exclusion glob relative to the root (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub(crate) exclude: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct RewriteArgs {
    /// Rule file (repeatable, applied in order). Defaults to `rules` from the config.
    #[arg(long = "rules", value_name = "FILE")]
    pub(crate) rules: Vec<PathBuf>,

    #[command(flatten)]
    pub(crate) scan: ScanArgs,

    /// Only process this file (relative to the root or absolute).
    #[arg(long, value_name = "FILE")]
    pub(crate) file: Option<PathBuf>,

    /// Compute and report everything, write nothing.
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Keep a `<file>.bak` copy of every rewritten file.
    #[arg(long)]
    pub(crate) backup: bool,

    /// Print a unified diff for every modified file.
    #[arg(long)]
    pub(crate) diff: bool,

    /// Structural tag to validate (repeatable; replaces the defaults).
    #[arg(long = "tag", value_name = "TAG")]
    pub(crate) tags: Vec<String>,

    /// Validate files the rules left unchanged as well.
    #[arg(long)]
    pub(crate) validate_all: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CheckTagsArgs {
    #[command(flatten)]
    pub(crate) scan: ScanArgs,

    /// Structural tag to validate (repeatable; replaces the defaults).
    #[arg(long = "tag", value_name = "TAG")]
    pub(crate) tags: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct AuditTextArgs {
    #[command(flatten)]
    pub(crate) scan: ScanArgs,

    /// Indicator word list, one word per line (default: built-in English list).
    #[arg(long, value_name = "FILE")]
    pub(crate) words: Option<PathBuf>,

    /// Known translation domain (repeatable; replaces `domains` from the config).
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub(crate) domains: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Apply rule files to every matching file and print the report.
    Rewrite(RewriteArgs),
    /// Check open/close balance of structural tags without rewriting.
    CheckTags(CheckTagsArgs),
    /// Report keys defined more than once in translation files.
    Duplicates {
        /// Translation files to check.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Compare the key sets of two translation files.
    CompareKeys {
        /// Reference file (e.g. messages.de.yaml).
        left: PathBuf,
        /// File to compare against (e.g. messages.en.yaml).
        right: PathBuf,
    },
    /// Find hardcoded text and questionable `|trans` usage in templates.
    AuditText(AuditTextArgs),
}
