//! Core result types for the rewrite pipeline.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Result of applying a rule set to one file's content.
///
/// Produced by [`crate::apply`]; the caller decides whether to persist
/// `content`.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteResult {
    /// SHA-256 hex digest of the original content.
    pub original_hash: String,
    /// Byte length of the original content.
    pub original_len: usize,
    /// Content after all rules ran.
    #[serde(skip)]
    pub content: String,
    /// Total number of rewrites across all rules.
    pub change_count: usize,
    /// One entry per rule that fired, in rule order.
    pub changes: Vec<RuleChange>,
    /// Lookup keys that matched a rule but had no table entry.
    pub unmapped: Vec<String>,
    /// Whether `content` differs from the original.
    pub modified: bool,
}

impl RewriteResult {
    /// A result with no changes for `original`.
    #[must_use]
    pub fn unchanged(original: &str) -> Self {
        Self {
            original_hash: content_hash(original),
            original_len: original.len(),
            content: original.to_string(),
            change_count: 0,
            changes: Vec::new(),
            unmapped: Vec::new(),
            modified: false,
        }
    }
}

/// Change summary for one rule within one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleChange {
    /// Rule name.
    pub rule: String,
    /// Human-readable description of what the rule does.
    pub description: String,
    /// Number of rewrites this rule performed.
    pub count: usize,
}

impl std::fmt::Display for RuleChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x)", self.description, self.count)
    }
}

/// SHA-256 hex digest of `content`.
#[must_use]
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
