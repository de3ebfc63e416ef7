//! Run reports.
//!
//! A [`RunReport`] is built incrementally while the engine walks the file
//! set and rendered once at the end, as text or JSON. A dry-run report and a
//! real first-pass report over the same input differ only in the write label.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{RewriteResult, RuleChange};
use crate::validate::ValidationIssue;

/// Marker prefixed to every warning and failure line.
pub const WARN_MARKER: &str = "WARN";

/// Per-file outcome of a successful pass.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    /// Path relative to the run root.
    pub path: PathBuf,
    /// SHA-256 of the content before the pass.
    pub original_hash: String,
    /// Byte length of the content before the pass.
    pub original_len: usize,
    /// Whether the file was (or would be) rewritten.
    pub modified: bool,
    /// Total rewrites in this file.
    pub change_count: usize,
    /// One entry per rule that fired.
    pub changes: Vec<RuleChange>,
    /// Unified diff, when previews were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// A file that could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Path relative to the run root.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Aggregate over one engine run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Directory that was scanned.
    pub root: PathBuf,
    /// Whether persistence was skipped.
    pub dry_run: bool,
    /// Rule files the run used.
    pub rule_sources: Vec<String>,
    /// Files attempted, including failures.
    pub files_scanned: usize,
    /// Files rewritten (or that would be in a dry run).
    pub files_modified: usize,
    /// Sum of all rewrites.
    pub total_changes: usize,
    /// Every successfully processed file, in scan order.
    pub files: Vec<FileSummary>,
    /// Walk, read and write failures, in scan order.
    pub failures: Vec<FileFailure>,
    /// Tag-balance issues in rewritten files.
    pub warnings: Vec<ValidationIssue>,
    /// Lookup keys without a table entry, across all files.
    pub unmapped: BTreeSet<String>,
}

impl RunReport {
    /// Empty report for a run over `root`.
    #[must_use]
    pub fn new(root: &Path, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
            rule_sources: Vec::new(),
            files_scanned: 0,
            files_modified: 0,
            total_changes: 0,
            files: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            unmapped: BTreeSet::new(),
        }
    }

    /// Record a successfully processed file.
    pub fn record(&mut self, path: &Path, result: &RewriteResult, diff: Option<String>) {
        self.files_scanned += 1;
        if result.modified {
            self.files_modified += 1;
        }
        self.total_changes += result.change_count;
        self.unmapped.extend(result.unmapped.iter().cloned());
        self.files.push(FileSummary {
            path: path.to_path_buf(),
            original_hash: result.original_hash.clone(),
            original_len: result.original_len,
            modified: result.modified,
            change_count: result.change_count,
            changes: result.changes.clone(),
            diff,
        });
    }

    /// Record a file that failed to read or write.
    pub fn record_failure(&mut self, path: &Path, reason: impl Into<String>) {
        self.files_scanned += 1;
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        });
    }

    /// Record part of the tree that could not be walked. Not counted as a
    /// scanned file.
    pub fn record_skipped(&mut self, failure: FileFailure) {
        self.failures.push(failure);
    }

    /// Record validation issues for `path`.
    pub fn record_issues(&mut self, path: &Path, issues: Vec<ValidationIssue>) {
        self.warnings.extend(issues.into_iter().map(|mut issue| {
            issue.path = path.to_path_buf();
            issue
        }));
    }

    /// True if anything needs human review.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty() || !self.unmapped.is_empty() || !self.failures.is_empty()
    }

    /// Persistence label: the only text that differs between dry and real runs.
    #[must_use]
    pub fn write_label(&self) -> &'static str {
        if self.dry_run { "would write" } else { "wrote" }
    }

    /// Render the human-readable report.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let label = self.write_label();

        let _ = writeln!(out, "Rewrite report for {}", self.root.display());
        if !self.rule_sources.is_empty() {
            let _ = writeln!(out, "Rules: {}", self.rule_sources.join(", "));
        }
        out.push('\n');

        for file in self.files.iter().filter(|f| f.modified) {
            let _ = writeln!(
                out,
                "{label} {}: {} change(s)",
                file.path.display(),
                file.change_count
            );
            for change in &file.changes {
                let _ = writeln!(out, "  - {change}");
            }
            if let Some(diff) = &file.diff {
                for line in diff.lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }

        out.push_str("\nSummary\n");
        let _ = writeln!(out, "  files scanned:  {}", self.files_scanned);
        let _ = writeln!(out, "  files modified: {} ({label})", self.files_modified);
        let _ = writeln!(out, "  total changes:  {}", self.total_changes);
        let _ = writeln!(out, "  failures:       {}", self.failures.len());

        if !self.warnings.is_empty() || !self.unmapped.is_empty() {
            out.push_str("\nWarnings\n");
            for issue in &self.warnings {
                let _ = writeln!(out, "  {WARN_MARKER} {}: {issue}", issue.path.display());
            }
            if !self.unmapped.is_empty() {
                let keys: Vec<&str> = self.unmapped.iter().map(String::as_str).collect();
                let _ = writeln!(
                    out,
                    "  {WARN_MARKER} unmapped lookup keys ({}): {}",
                    keys.len(),
                    keys.join(", ")
                );
            }
        }

        if !self.failures.is_empty() {
            out.push_str("\nFailures\n");
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "  {WARN_MARKER} {}: {}",
                    failure.path.display(),
                    failure.reason
                );
            }
        }

        out
    }

    /// Render the report as pretty JSON.
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
