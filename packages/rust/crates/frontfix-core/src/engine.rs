//! Batch rewrite engine.
//!
//! Resolver -> (per file) read -> rewrite -> persist unless dry-run ->
//! validate -> report. Runs sequentially on one thread. A file that fails to
//! read or write is recorded and skipped; the run always finishes with a
//! report. An interrupted run leaves already written files modified, which is
//! what backups and dry runs are for.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::diff::unified_diff;
use crate::error::EngineError;
use crate::io;
use crate::report::RunReport;
use crate::resolver::{FileCandidate, ResolveOptions, ResolvedFiles, resolve_files};
use crate::rewriter::apply;
use crate::ruleset::RuleSet;
use crate::types::RewriteResult;
use crate::validate::{DEFAULT_STRUCTURAL_TAGS, ValidationIssue, validate, validate_change};

/// Per-run behaviour switches.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute and report everything, write nothing.
    pub dry_run: bool,
    /// Copy each file to `<file><suffix>` before overwriting it.
    pub backup_suffix: Option<String>,
    /// Tags checked for open/close balance.
    pub structural_tags: Vec<String>,
    /// Files larger than this are failures.
    pub max_file_size: u64,
    /// Attach a unified diff to every modified file.
    pub show_diff: bool,
    /// Validate files the rules did not change as well.
    pub validate_unchanged: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup_suffix: None,
            structural_tags: DEFAULT_STRUCTURAL_TAGS.iter().map(ToString::to_string).collect(),
            max_file_size: 1024 * 1024, // 1MB
            show_diff: false,
            validate_unchanged: false,
        }
    }
}

struct FileOutcome {
    result: RewriteResult,
    issues: Vec<ValidationIssue>,
    diff: Option<String>,
}

/// Drives a rule set over a file set.
#[derive(Debug, Clone)]
pub struct Engine {
    rules: RuleSet,
    options: RunOptions,
}

impl Engine {
    /// Create an engine. Rules are already compiled, so no config error can
    /// surface after this point.
    #[must_use]
    pub fn new(rules: RuleSet, options: RunOptions) -> Self {
        Self { rules, options }
    }

    /// Resolve files and run the pipeline over them.
    ///
    /// # Errors
    /// Only resolution errors (`RootNotFound`, `TargetNotFound`, `Config`);
    /// per-file errors end up in the report.
    pub fn run(&self, resolve: &ResolveOptions) -> Result<RunReport, EngineError> {
        let resolved = resolve_files(resolve)?;
        info!(
            root = %resolve.root.display(),
            files = resolved.len(),
            skipped = resolved.skipped.len(),
            rules = self.rules.len(),
            dry_run = self.options.dry_run,
            "starting rewrite run"
        );
        Ok(self.run_files(&resolve.root, &resolved))
    }

    /// Run the pipeline over an already resolved file set. Parts of the
    /// tree the resolver could not walk are reported as failures.
    #[must_use]
    pub fn run_files(&self, root: &Path, resolved: &ResolvedFiles) -> RunReport {
        let mut report = RunReport::new(root, self.options.dry_run);
        report.rule_sources = self.rules.sources().to_vec();
        for skipped in &resolved.skipped {
            report.record_skipped(skipped.clone());
        }

        for file in &resolved.files {
            match self.process(file) {
                Ok(outcome) => {
                    report.record(&file.relative, &outcome.result, outcome.diff);
                    report.record_issues(&file.relative, outcome.issues);
                }
                Err(e) => {
                    warn!(path = %file.relative.display(), error = %e, "file skipped");
                    report.record_failure(&file.relative, failure_reason(&e));
                }
            }
        }

        info!(
            scanned = report.files_scanned,
            modified = report.files_modified,
            changes = report.total_changes,
            failures = report.failures.len(),
            "rewrite run complete"
        );
        report
    }

    fn process(&self, file: &FileCandidate) -> Result<FileOutcome, EngineError> {
        let original =
            io::read_text(&file.path, self.options.max_file_size).map_err(|source| {
                EngineError::Read {
                    path: file.path.clone(),
                    source,
                }
            })?;

        let result = apply(&original, self.rules.rules());
        debug!(
            path = %file.relative.display(),
            changes = result.change_count,
            "rewritten in memory"
        );

        if !result.modified {
            let issues = if self.options.validate_unchanged {
                validate(&original, &self.options.structural_tags)
            } else {
                Vec::new()
            };
            return Ok(FileOutcome {
                result,
                issues,
                diff: None,
            });
        }

        if !self.options.dry_run {
            self.persist(file, &result.content)?;
        }

        let issues = validate_change(&original, &result.content, &self.options.structural_tags);
        let diff = self.options.show_diff.then(|| {
            unified_diff(
                &file.relative.to_string_lossy(),
                &original,
                &result.content,
            )
        });

        Ok(FileOutcome {
            result,
            issues,
            diff,
        })
    }

    fn persist(&self, file: &FileCandidate, content: &str) -> Result<(), EngineError> {
        if let Some(suffix) = &self.options.backup_suffix {
            io::write_backup(&file.path, suffix).map_err(|source| EngineError::Write {
                path: io::backup_path(&file.path, suffix),
                source,
            })?;
        }
        io::write_text(&file.path, content).map_err(|source| EngineError::Write {
            path: file.path.clone(),
            source,
        })?;
        debug!(path = %file.relative.display(), "written");
        Ok(())
    }
}

fn failure_reason(error: &EngineError) -> String {
    match error {
        EngineError::Read { source, .. } => format!("read failed: {source}"),
        EngineError::Write { path, source } => {
            format!("write failed ({}): {source}", path.display())
        }
        other => other.to_string(),
    }
}
