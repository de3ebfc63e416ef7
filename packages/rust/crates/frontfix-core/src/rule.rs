//! Compiled rewrite rules.
//!
//! A rule is an immutable (pattern, replacement, guard) triple plus an
//! optional occurrence limit. Rules are pure: the same input always yields
//! the same output. Rule *authors* are responsible for idempotence: a rule
//! is idempotent only if its replacement can never match its own pattern
//! (or its guard rejects the rewritten text). The engine does not check this.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::EngineError;

/// Default guard window, in characters.
pub const DEFAULT_GUARD_WINDOW: usize = 150;

/// Static key-to-value table used by lookup rules (icon maps, translations).
pub type LookupTable = BTreeMap<String, String>;

/// Whether a guard pattern must or must not be found in its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    /// Skip the match unless the guard matches.
    #[default]
    Require,
    /// Skip the match if the guard matches.
    Forbid,
}

/// Which side of the match the guard window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardSide {
    /// Text immediately preceding the match start. `$` anchors at the match.
    #[default]
    Before,
    /// Text immediately following the match end. `^` anchors at the match.
    After,
}

/// Unit of text a rule sees at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Whole file content.
    #[default]
    Document,
    /// One line at a time, without its terminator.
    Line,
}

/// Secondary pattern checked against a fixed window next to a match.
#[derive(Debug, Clone)]
pub struct ContextGuard {
    regex: Regex,
    mode: GuardMode,
    side: GuardSide,
    window: usize,
}

impl ContextGuard {
    /// Compile a guard.
    ///
    /// # Errors
    /// Returns the regex compilation error.
    pub fn new(
        pattern: &str,
        mode: GuardMode,
        side: GuardSide,
        window: usize,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            mode,
            side,
            window,
        })
    }

    /// Decide whether the match at `start..end` of `text` may be rewritten.
    #[must_use]
    pub fn allows(&self, text: &str, start: usize, end: usize) -> bool {
        let window = match self.side {
            GuardSide::Before => window_before(text, start, self.window),
            GuardSide::After => window_after(text, end, self.window),
        };
        let found = self.regex.is_match(window);
        match self.mode {
            GuardMode::Require => found,
            GuardMode::Forbid => !found,
        }
    }
}

/// Up to `chars` characters ending at byte offset `start`.
fn window_before(text: &str, start: usize, chars: usize) -> &str {
    if chars == 0 {
        return "";
    }
    let head = &text[..start];
    let from = head
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map_or(0, |(i, _)| i);
    &head[from..]
}

/// Up to `chars` characters starting at byte offset `end`.
fn window_after(text: &str, end: usize, chars: usize) -> &str {
    let tail = &text[end..];
    let to = tail.char_indices().nth(chars).map_or(tail.len(), |(i, _)| i);
    &tail[..to]
}

/// How a match is turned into replacement text.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Capture template (`$1`, `${name}`, `$$` for a literal dollar).
    Template(String),
    /// Table lookup keyed by a capture group.
    Lookup(Lookup),
}

/// Lookup replacement: `key` names the capture group (`0` for the whole
/// match, a number, or a group name); `template` is capture-expanded first,
/// then `{value}` is substituted with the table entry.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Shared read-only table.
    pub table: Arc<LookupTable>,
    /// Capture group holding the lookup key.
    pub key: String,
    /// Output template.
    pub template: String,
}

impl Lookup {
    /// Extract the lookup key from a match.
    #[must_use]
    pub fn key_of<'h>(&self, caps: &Captures<'h>) -> Option<&'h str> {
        let group = match self.key.parse::<usize>() {
            Ok(index) => caps.get(index),
            Err(_) => caps.name(&self.key),
        };
        group.map(|m| m.as_str())
    }
}

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    description: String,
    regex: Regex,
    replacement: Replacement,
    guard: Option<ContextGuard>,
    limit: Option<usize>,
    scope: RuleScope,
    respect_template_tags: bool,
}

impl RewriteRule {
    /// Rule with a capture-template replacement.
    ///
    /// # Errors
    /// `EngineError::Pattern` if `pattern` does not compile.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, EngineError> {
        Self::build(name.into(), pattern, Replacement::Template(replacement.into()))
    }

    /// Rule that replaces each match with a table value.
    ///
    /// # Errors
    /// `EngineError::Pattern` if `pattern` does not compile, `Config` if
    /// `key` names a capture group the pattern does not have.
    pub fn lookup(
        name: impl Into<String>,
        pattern: &str,
        table: Arc<LookupTable>,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let lookup = Lookup {
            table,
            key: key.into(),
            template: template.into(),
        };
        let rule = Self::build(name.into(), pattern, Replacement::Lookup(lookup.clone()))?;
        let known = match lookup.key.parse::<usize>() {
            Ok(index) => index < rule.regex.captures_len(),
            Err(_) => rule.regex.capture_names().flatten().any(|n| n == lookup.key),
        };
        if !known {
            return Err(EngineError::Config(format!(
                "rule '{}' uses unknown key group '{}'",
                rule.name, lookup.key
            )));
        }
        Ok(rule)
    }

    fn build(name: String, pattern: &str, replacement: Replacement) -> Result<Self, EngineError> {
        let regex = Regex::new(pattern).map_err(|source| EngineError::Pattern {
            rule: name.clone(),
            source,
        })?;
        Ok(Self {
            description: name.clone(),
            name,
            regex,
            replacement,
            guard: None,
            limit: None,
            scope: RuleScope::Document,
            respect_template_tags: true,
        })
    }

    /// Set the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a context guard.
    ///
    /// # Errors
    /// `EngineError::Pattern` if the guard pattern does not compile.
    pub fn with_guard(
        mut self,
        pattern: &str,
        mode: GuardMode,
        side: GuardSide,
        window: usize,
    ) -> Result<Self, EngineError> {
        let guard =
            ContextGuard::new(pattern, mode, side, window).map_err(|source| EngineError::Pattern {
                rule: self.name.clone(),
                source,
            })?;
        self.guard = Some(guard);
        Ok(self)
    }

    /// Rewrite only the first `limit` accepted matches per file.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the rule scope.
    #[must_use]
    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    /// Toggle rejection of matches that cut through template tags.
    #[must_use]
    pub fn with_template_tags(mut self, respect: bool) -> Self {
        self.respect_template_tags = respect;
        self
    }

    /// Rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Compiled match pattern.
    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Replacement strategy.
    #[must_use]
    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    /// Context guard, if any.
    #[must_use]
    pub fn guard(&self) -> Option<&ContextGuard> {
        self.guard.as_ref()
    }

    /// Occurrence limit, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Rule scope.
    #[must_use]
    pub fn scope(&self) -> RuleScope {
        self.scope
    }

    /// Whether template-tag spans are protected.
    #[must_use]
    pub fn respects_template_tags(&self) -> bool {
        self.respect_template_tags
    }
}
