//! Structural tag-balance check.
//!
//! This is a counting heuristic, not a parser. For each tracked tag it
//! compares the number of opening markers (`<tag` followed by whitespace,
//! `/` or `>`) with closing markers (`</tag>`, whitespace allowed before `>`).
//! Known blind spots: equal counts with wrong nesting pass; markers inside
//! HTML comments, attribute values or template strings are counted; void
//! and self-closing elements are counted as opens.

use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;

/// Tags checked when no explicit set is configured.
pub const DEFAULT_STRUCTURAL_TAGS: [&str; 11] = [
    "div", "section", "h1", "h2", "h3", "h4", "h5", "h6", "table", "ul", "ol",
];

/// Unequal open/close counts for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// File the issue was found in (empty when validating bare content).
    pub path: PathBuf,
    /// Tag name.
    pub tag: String,
    /// Opening markers counted.
    pub opens: usize,
    /// Closing markers counted.
    pub closes: usize,
    /// True when the content was balanced for this tag before rewriting.
    pub introduced: bool,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{}> unbalanced: {} open / {} close",
            self.tag, self.opens, self.closes
        )?;
        if self.introduced {
            write!(f, " (introduced by rewrite)")?;
        }
        Ok(())
    }
}

/// Count opening and closing markers of `tag` in `content`.
#[must_use]
pub fn count_tag(content: &str, tag: &str) -> (usize, usize) {
    let tag = regex::escape(tag);
    // Both patterns are built from an escaped literal and always compile.
    let open = Regex::new(&format!(r"(?i)<{tag}[\s/>]")).ok();
    let close = Regex::new(&format!(r"(?i)</{tag}\s*>")).ok();
    let count = |re: Option<Regex>| re.map_or(0, |re| re.find_iter(content).count());
    (count(open), count(close))
}

/// Report every tag in `tags` whose open and close counts differ.
#[must_use]
pub fn validate<S: AsRef<str>>(content: &str, tags: &[S]) -> Vec<ValidationIssue> {
    tags.iter()
        .filter_map(|tag| {
            let tag = tag.as_ref();
            let (opens, closes) = count_tag(content, tag);
            (opens != closes).then(|| ValidationIssue {
                path: PathBuf::new(),
                tag: tag.to_string(),
                opens,
                closes,
                introduced: false,
            })
        })
        .collect()
}

/// Validate rewritten content and flag issues the rewrite introduced.
#[must_use]
pub fn validate_change<S: AsRef<str>>(
    original: &str,
    rewritten: &str,
    tags: &[S],
) -> Vec<ValidationIssue> {
    let mut issues = validate(rewritten, tags);
    for issue in &mut issues {
        let (opens, closes) = count_tag(original, &issue.tag);
        issue.introduced = opens == closes;
    }
    issues
}
