//! frontfix CLI: rule-driven rewrites and read-only audits.
//!
//! Reports are printed to stdout; logs go to stderr.
//!
//! Logging: set `RUST_LOG=frontfix_core=debug` (or `warn`) to override the
//! default level; `--verbose` raises it to `debug`.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use frontfix_core::FrontfixConfig;

use crate::cli::{Cli, Command};
use crate::commands::{
    run_audit_text, run_check_tags, run_compare_keys, run_duplicates, run_rewrite,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "frontfix=debug,frontfix_core=debug"
        } else {
            "frontfix=info,frontfix_core=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = FrontfixConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Command::Rewrite(args) => run_rewrite(config, args, cli.output),
        Command::CheckTags(args) => run_check_tags(config, args, cli.output),
        Command::Duplicates { files } => run_duplicates(&config, files, cli.output),
        Command::CompareKeys { left, right } => {
            run_compare_keys(&config, &left, &right, cli.output)
        }
        Command::AuditText(args) => run_audit_text(config, args, cli.output),
    }
}
