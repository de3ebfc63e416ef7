//! Subcommand implementations. Reports go to stdout, logs to stderr.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use frontfix_core::{
    DuplicateKey, Engine, FileFailure, FrontfixConfig, KeyIndex, KeyKind, RuleSet,
    TextClassifier, ValidationIssue, WARN_MARKER, WordListClassifier, audit_files, compare_keys,
    read_text, resolve_files, validate,
};

use crate::cli::{AuditTextArgs, CheckTagsArgs, OutputFormat, RewriteArgs, ScanArgs};

fn emit<T: Serialize>(
    value: &T,
    output: OutputFormat,
    text: impl FnOnce() -> String,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(value)
                .context("failed to serialize CLI output as JSON")?;
            println!("{rendered}");
        }
        OutputFormat::Text => print!("{}", text()),
    }
    Ok(())
}

fn apply_scan(config: &mut FrontfixConfig, scan: ScanArgs) {
    if let Some(root) = scan.root {
        config.root = root;
    }
    if !scan.extensions.is_empty() {
        config.extensions = scan.extensions;
    }
    if !scan.exclude.is_empty() {
        config.exclude = scan.exclude;
    }
}

pub(crate) fn run_rewrite(
    mut config: FrontfixConfig,
    args: RewriteArgs,
    output: OutputFormat,
) -> Result<()> {
    apply_scan(&mut config, args.scan);
    if !args.tags.is_empty() {
        config.structural_tags = args.tags;
    }
    let rule_files = if args.rules.is_empty() {
        config.rules.clone()
    } else {
        args.rules
    };
    if rule_files.is_empty() {
        bail!("no rule files given (use --rules or set `rules` in the config)");
    }

    let rules = RuleSet::load_all(&rule_files).context("failed to load rule files")?;
    info!(rules = rules.len(), files = rule_files.len(), "rule set compiled");

    if args.validate_all {
        config.validate_all = true;
    }
    let mut options = config.run_options(args.dry_run, args.backup);
    options.show_diff = args.diff;
    let mut resolve = config.resolve_options();
    resolve.target = args.file;

    let report = Engine::new(rules, options)
        .run(&resolve)
        .context("rewrite run aborted")?;
    if !report.failures.is_empty() {
        warn!(failures = report.failures.len(), "some files were skipped");
    }
    emit(&report, output, || report.render_text())
}

#[derive(Debug, Serialize)]
struct TagReport {
    root: PathBuf,
    files_scanned: usize,
    issues: Vec<ValidationIssue>,
    failures: Vec<FileFailure>,
}

impl TagReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Tag check for {}", self.root.display());
        for issue in &self.issues {
            let _ = writeln!(out, "  {WARN_MARKER} {}: {issue}", issue.path.display());
        }
        for failure in &self.failures {
            let _ = writeln!(
                out,
                "  {WARN_MARKER} {}: {}",
                failure.path.display(),
                failure.reason
            );
        }
        let _ = writeln!(
            out,
            "{} file(s) scanned, {} issue(s), {} failure(s)",
            self.files_scanned,
            self.issues.len(),
            self.failures.len()
        );
        out
    }
}

pub(crate) fn run_check_tags(
    mut config: FrontfixConfig,
    args: CheckTagsArgs,
    output: OutputFormat,
) -> Result<()> {
    apply_scan(&mut config, args.scan);
    if !args.tags.is_empty() {
        config.structural_tags = args.tags;
    }

    let resolved = resolve_files(&config.resolve_options()).context("failed to resolve files")?;
    let mut report = TagReport {
        root: config.root.clone(),
        files_scanned: resolved.len(),
        issues: Vec::new(),
        failures: resolved.skipped.clone(),
    };
    for file in &resolved.files {
        match read_text(&file.path, config.max_file_size) {
            Ok(content) => {
                report.issues.extend(
                    validate(&content, &config.structural_tags)
                        .into_iter()
                        .map(|mut issue| {
                            issue.path.clone_from(&file.relative);
                            issue
                        }),
                );
            }
            Err(e) => report.failures.push(FileFailure {
                path: file.relative.clone(),
                reason: format!("read failed: {e}"),
            }),
        }
    }
    emit(&report, output, || report.render_text())
}

#[derive(Debug, Serialize)]
struct FileDuplicates {
    path: PathBuf,
    duplicates: Vec<DuplicateKey>,
}

fn load_index(path: &Path, max_bytes: u64) -> Result<KeyIndex> {
    let text = read_text(path, max_bytes)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(KeyIndex::parse(&text))
}

pub(crate) fn run_duplicates(
    config: &FrontfixConfig,
    files: Vec<PathBuf>,
    output: OutputFormat,
) -> Result<()> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let duplicates = load_index(&path, config.max_file_size)?.duplicates();
        results.push(FileDuplicates { path, duplicates });
    }

    emit(&results, output, || {
        let mut out = String::new();
        for file in &results {
            let _ = writeln!(
                out,
                "{}: {} duplicate key(s)",
                file.path.display(),
                file.duplicates.len()
            );
            for dup in &file.duplicates {
                let lines: Vec<String> =
                    dup.occurrences.iter().map(|o| o.line.to_string()).collect();
                let kind = match dup.kind {
                    KeyKind::Leaf => "key",
                    KeyKind::Section => "section",
                };
                let _ = writeln!(out, "  {} ({kind}) lines {}", dup.key, lines.join(", "));
            }
        }
        out
    })
}

pub(crate) fn run_compare_keys(
    config: &FrontfixConfig,
    left: &Path,
    right: &Path,
    output: OutputFormat,
) -> Result<()> {
    let cmp = compare_keys(
        &load_index(left, config.max_file_size)?,
        &load_index(right, config.max_file_size)?,
    );

    emit(&cmp, output, || {
        let mut out = String::new();
        for (path, keys) in [(left, &cmp.only_left), (right, &cmp.only_right)] {
            let _ = writeln!(out, "Only in {} ({}):", path.display(), keys.len());
            for missing in keys {
                let _ = writeln!(out, "  {}: {}", missing.key, missing.value);
            }
        }
        for (path, sections) in [
            (left, &cmp.sections_only_left),
            (right, &cmp.sections_only_right),
        ] {
            if sections.is_empty() {
                continue;
            }
            let _ = writeln!(
                out,
                "Sections only in {} ({}):",
                path.display(),
                sections.len()
            );
            for section in sections {
                let _ = writeln!(out, "  {section}");
            }
        }
        let _ = writeln!(out, "Common keys: {}", cmp.common);
        out
    })
}

pub(crate) fn run_audit_text(
    mut config: FrontfixConfig,
    args: AuditTextArgs,
    output: OutputFormat,
) -> Result<()> {
    apply_scan(&mut config, args.scan);
    let classifier: Box<dyn TextClassifier> = match args.words.or_else(|| config.words.clone()) {
        Some(path) => {
            let list = read_text(&path, config.max_file_size)
                .with_context(|| format!("failed to read word list {}", path.display()))?;
            Box::new(WordListClassifier::from_list(&list))
        }
        None => Box::new(WordListClassifier::default()),
    };

    let domains: HashSet<String> = if args.domains.is_empty() {
        config.domains.iter().cloned().collect()
    } else {
        args.domains.into_iter().collect()
    };

    let resolved = resolve_files(&config.resolve_options()).context("failed to resolve files")?;
    let report = audit_files(
        &resolved,
        classifier.as_ref(),
        &domains,
        config.max_file_size,
    );

    emit(&report, output, || {
        let mut out = String::new();
        for file in &report.files {
            for finding in &file.findings {
                let _ = writeln!(out, "{}:{}: {finding}", file.path.display(), finding.line);
            }
        }
        for (kind, count) in report.count_by_kind() {
            let _ = writeln!(out, "  {}: {count}", kind.label());
        }
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "{WARN_MARKER} {}: {}",
                failure.path.display(),
                failure.reason
            );
        }
        let _ = writeln!(
            out,
            "{} finding(s) in {} of {} file(s)",
            report.total(),
            report.files.len(),
            report.files_scanned
        );
        out
    })
}
