//! Translation audit for templates.
//!
//! Finds element text and translatable attribute values that look like
//! untranslated prose, and `|trans` calls that lack arguments or name no
//! domain or an unknown one. Deciding what "looks untranslated" is delegated to a
//! [`TextClassifier`]; the default [`WordListClassifier`] flags text
//! containing common English words. Expected error profile of the word list:
//! false positives on words shared with other languages ("info", "status"),
//! false negatives on English text without any listed word ("Dashboard").
//! None of this touches the rewrite core.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::io;
use crate::report::FileFailure;
use crate::resolver::ResolvedFiles;

/// Decides whether a piece of visible text needs translation.
pub trait TextClassifier {
    /// True if `text` should have gone through the translator.
    fn is_untranslated(&self, text: &str) -> bool;
}

impl<F: Fn(&str) -> bool> TextClassifier for F {
    fn is_untranslated(&self, text: &str) -> bool {
        self(text)
    }
}

/// Indicator words used when no custom list is configured.
pub const DEFAULT_INDICATORS: &[&str] = &[
    "the", "and", "or", "for", "to", "of", "in", "on", "at", "by", "with", "from", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "should", "could", "may", "might", "must", "can", "new", "edit", "delete", "create",
    "update", "save", "cancel", "back", "next", "previous", "search", "filter", "export",
    "import", "view", "show", "hide", "loading", "error", "success", "warning", "info", "submit",
    "reset",
];

/// Attributes whose values are user-visible.
pub const TRANSLATABLE_ATTRIBUTES: &[&str] = &[
    "title",
    "alt",
    "placeholder",
    "aria-label",
    "data-original-title",
    "data-confirm",
    "data-bs-title",
    "aria-description",
];

/// Flags text containing at least one indicator word (case-insensitive).
#[derive(Debug, Clone)]
pub struct WordListClassifier {
    words: HashSet<String>,
}

impl WordListClassifier {
    /// Classifier over the given words.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty() && !w.starts_with('#'))
                .collect(),
        }
    }

    /// Classifier from a word list file body (one word per line, `#` comments).
    #[must_use]
    pub fn from_list(text: &str) -> Self {
        Self::new(text.lines())
    }
}

impl Default for WordListClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INDICATORS)
    }
}

impl TextClassifier for WordListClassifier {
    fn is_untranslated(&self, text: &str) -> bool {
        text.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .any(|w| self.words.contains(&w.to_lowercase()))
    }
}

/// What kind of problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Text between an element's tags.
    ElementText,
    /// A translatable attribute value.
    Attribute,
    /// `'key'|trans` without arguments in a file with no default domain.
    MissingTransParams,
    /// `'key'|trans(..)` without a domain argument.
    NoDomain,
    /// `'key'|trans(.., 'domain')` naming a domain outside the known set.
    InvalidDomain,
}

impl FindingKind {
    /// Stable snake_case label, as used in JSON output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ElementText => "element_text",
            Self::Attribute => "attribute",
            Self::MissingTransParams => "missing_trans_params",
            Self::NoDomain => "no_domain",
            Self::InvalidDomain => "invalid_domain",
        }
    }
}

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextFinding {
    /// 1-indexed line number.
    pub line: usize,
    /// What was found.
    pub kind: FindingKind,
    /// Element or attribute name, or the translation key.
    pub name: String,
    /// The suspicious text; for `InvalidDomain` the domain, for the other
    /// translation kinds the matched expression.
    pub text: String,
}

impl std::fmt::Display for TextFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FindingKind::ElementText => write!(f, "<{}> {}", self.name, self.text),
            FindingKind::Attribute => write!(f, "{}= {}", self.name, self.text),
            FindingKind::MissingTransParams => write!(f, "{} without arguments", self.text),
            FindingKind::NoDomain => write!(f, "{} without domain", self.text),
            FindingKind::InvalidDomain => {
                write!(f, "'{}' uses unknown domain '{}'", self.name, self.text)
            }
        }
    }
}

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_pattern_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

// Closed element on one line, or an element whose text runs to line end.
// The regex crate has no backreferences; closing names are compared in code.
static ELEMENT_CLOSED: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"<(h[1-6]|p|span|label|button|a|td|th|li|div)(?:\s[^>]*)?>([^<{]+)</([a-z0-9]+)>")
});
static ELEMENT_OPEN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"<(h[1-6]|p|span|label|button)(?:\s[^>]*)?>([^<{]+)$"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r#"(?:^|\s)([a-z][a-z-]*)=(?:"([^"{]*)"|'([^'{]*)')"#)
});
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"^[\d\s\-/.,:;#]+$"));

static DEFAULT_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r#"\{%\s*trans_default_domain\s+['"](\w+)['"]\s*%\}"#)
});
// Followed by `(` means arguments; checked in code for lack of lookahead.
static TRANS_BARE: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"'([^']+)'\|trans"));
static TRANS_CALL: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"'([^']+)'\|trans\((\{[^}]*\}(?:\s*,\s*'[^']*')?|\s*'[^']*'|)\)")
});
static DOMAIN_AT_END: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#",\s*['"](\w+)['"]\s*$"#));
static DOMAIN_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"^\s*['"](\w+)['"]\s*$"#));
static DOMAIN_AFTER_EMPTY: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"\{\s*\}\s*,\s*['"](\w+)['"]"#));

fn is_numeric(text: &str) -> bool {
    NUMERIC.is_match(text)
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("{#")
}

/// Scan template `content` for hardcoded text.
///
/// Twig comment lines are skipped. Element text is not checked on lines
/// that are mostly Twig code or already use `|trans`. Numeric or symbolic
/// values, URLs, paths, anchors and icon or button classes never count.
pub fn find_hardcoded_text(
    content: &str,
    classifier: &dyn TextClassifier,
) -> Vec<TextFinding> {
    let mut findings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if is_comment_or_blank(line) {
            continue;
        }
        let line_no = idx + 1;

        if line.matches('{').count() <= 3
            && line.matches('%').count() <= 2
            && !line.contains("|trans")
        {
            element_text(line, line_no, classifier, &mut findings);
        }
        attributes(line, line_no, classifier, &mut findings);
    }

    findings
}

/// Scan template `content` for questionable `|trans` usage.
///
/// Bare `'key'|trans` is only reported when the file sets no
/// `{% trans_default_domain %}`. An empty `domains` set accepts every
/// domain.
#[must_use]
pub fn find_trans_issues(content: &str, domains: &HashSet<String>) -> Vec<TextFinding> {
    let has_default_domain = DEFAULT_DOMAIN.is_match(content);
    let mut findings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if is_comment_or_blank(line) {
            continue;
        }
        let line_no = idx + 1;

        if !has_default_domain {
            for caps in TRANS_BARE.captures_iter(line) {
                let (Some(all), Some(key)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                if line[all.end()..].starts_with('(') {
                    continue;
                }
                findings.push(TextFinding {
                    line: line_no,
                    kind: FindingKind::MissingTransParams,
                    name: key.as_str().to_string(),
                    text: all.as_str().to_string(),
                });
            }
        }

        for caps in TRANS_CALL.captures_iter(line) {
            let (Some(all), Some(key), Some(params)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            match call_domain(params.as_str()) {
                None => findings.push(TextFinding {
                    line: line_no,
                    kind: FindingKind::NoDomain,
                    name: key.as_str().to_string(),
                    text: all.as_str().to_string(),
                }),
                Some(domain) if !domains.is_empty() && !domains.contains(domain) => {
                    findings.push(TextFinding {
                        line: line_no,
                        kind: FindingKind::InvalidDomain,
                        name: key.as_str().to_string(),
                        text: domain.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    findings
}

/// The domain named by the argument list of a `|trans(..)` call.
fn call_domain(params: &str) -> Option<&str> {
    if let Some(domain) = first_group(&DOMAIN_AT_END, params) {
        return Some(domain);
    }
    if params.trim() == "{}" {
        return None;
    }
    first_group(&DOMAIN_AFTER_EMPTY, params).or_else(|| first_group(&DOMAIN_ONLY, params))
}

fn first_group<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Every finding for one template, in line order.
#[must_use]
pub fn audit_template(
    content: &str,
    classifier: &dyn TextClassifier,
    domains: &HashSet<String>,
) -> Vec<TextFinding> {
    let mut findings = find_hardcoded_text(content, classifier);
    findings.extend(find_trans_issues(content, domains));
    findings.sort_by_key(|f| f.line);
    findings
}

fn element_text(
    line: &str,
    line_no: usize,
    classifier: &dyn TextClassifier,
    findings: &mut Vec<TextFinding>,
) {
    let closed = ELEMENT_CLOSED.captures_iter(line);
    let open = ELEMENT_OPEN.captures_iter(line);

    for caps in closed.chain(open) {
        let (Some(name), Some(text)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if caps.get(3).is_some_and(|close| close.as_str() != name.as_str()) {
            continue;
        }
        let text = text.as_str().trim();
        if text.is_empty() || is_numeric(text) || !classifier.is_untranslated(text) {
            continue;
        }
        findings.push(TextFinding {
            line: line_no,
            kind: FindingKind::ElementText,
            name: name.as_str().to_string(),
            text: text.to_string(),
        });
    }
}

fn attributes(
    line: &str,
    line_no: usize,
    classifier: &dyn TextClassifier,
    findings: &mut Vec<TextFinding>,
) {
    for caps in ATTRIBUTE.captures_iter(line) {
        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if !TRANSLATABLE_ATTRIBUTES.contains(&name) {
            continue;
        }
        let Some(value) = caps.get(2).or_else(|| caps.get(3)) else {
            continue;
        };
        let value = value.as_str().trim();
        if value.is_empty()
            || is_numeric(value)
            || ["http", "/", ".", "#", "bi-", "btn-"]
                .iter()
                .any(|p| value.starts_with(p))
            || !classifier.is_untranslated(value)
        {
            continue;
        }
        findings.push(TextFinding {
            line: line_no,
            kind: FindingKind::Attribute,
            name: name.to_string(),
            text: value.to_string(),
        });
    }
}

/// Findings for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileFindings {
    /// Path relative to the scan root.
    pub path: std::path::PathBuf,
    /// Findings in line order.
    pub findings: Vec<TextFinding>,
}

/// Result of auditing a file set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Files with at least one finding, in scan order.
    pub files: Vec<FileFindings>,
    /// Files that could not be read and directories that could not be
    /// walked.
    pub failures: Vec<FileFailure>,
    /// Files looked at.
    pub files_scanned: usize,
}

impl AuditReport {
    /// Total findings across all files.
    #[must_use]
    pub fn total(&self) -> usize {
        self.files.iter().map(|f| f.findings.len()).sum()
    }

    /// Finding counts per kind.
    #[must_use]
    pub fn count_by_kind(&self) -> BTreeMap<FindingKind, usize> {
        let mut counts = BTreeMap::new();
        for finding in self.files.iter().flat_map(|f| &f.findings) {
            *counts.entry(finding.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Audit every resolved file. Unreadable files and unwalkable directories
/// are recorded, not fatal.
#[must_use]
pub fn audit_files(
    resolved: &ResolvedFiles,
    classifier: &dyn TextClassifier,
    domains: &HashSet<String>,
    max_file_size: u64,
) -> AuditReport {
    let mut report = AuditReport {
        failures: resolved.skipped.clone(),
        ..AuditReport::default()
    };
    for file in &resolved.files {
        report.files_scanned += 1;
        match io::read_text(&file.path, max_file_size) {
            Ok(content) => {
                let findings = audit_template(&content, classifier, domains);
                if !findings.is_empty() {
                    report.files.push(FileFindings {
                        path: file.relative.clone(),
                        findings,
                    });
                }
            }
            Err(e) => {
                warn!(path = %file.relative.display(), error = %e, "audit skipped file");
                report.failures.push(FileFailure {
                    path: file.relative.clone(),
                    reason: format!("read failed: {e}"),
                });
            }
        }
    }
    report
}
