//! Line-oriented audit of YAML translation files.
//!
//! Duplicate keys are exactly the mistake this module has to see, and a YAML
//! parser never reports them with line numbers: `serde_yaml` rejects the
//! whole document, while other loaders silently keep the last value. So
//! files are read line by line: indentation gives the hierarchy, `key: value` lines are leaves and
//! `key:` lines open a section. Comments, list items, document markers and
//! block scalar bodies (`|`, `>`) are skipped.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// One place a key path was defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOccurrence {
    /// 1-indexed line number.
    pub line: usize,
    /// Raw value text (empty for sections).
    pub value: String,
}

/// Whether a repeated key is a leaf or a section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// `key: value`
    Leaf,
    /// `key:` followed by nested keys. A repeated section replaces the
    /// earlier one when the file is loaded.
    Section,
}

/// A key path defined more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    /// Dotted key path.
    pub key: String,
    /// Leaf or section.
    pub kind: KeyKind,
    /// Every definition, in file order.
    pub occurrences: Vec<KeyOccurrence>,
}

/// Key paths of one translation file.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    leaves: BTreeMap<String, Vec<KeyOccurrence>>,
    sections: BTreeMap<String, Vec<KeyOccurrence>>,
}

impl KeyIndex {
    /// Index every key path in `content`.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut index = Self::default();
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut block_parent: Option<usize> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let body = raw.trim_start();
            let indent = raw.len() - body.len();

            if let Some(parent) = block_parent {
                if body.is_empty() || indent > parent {
                    continue;
                }
                block_parent = None;
            }
            if body.is_empty() || body.starts_with('#') || body.starts_with('-') {
                continue;
            }
            let Some((key, rest)) = split_key(body) else {
                continue;
            };

            while stack.last().is_some_and(|(level, _)| *level >= indent) {
                stack.pop();
            }
            let path = stack
                .iter()
                .map(|(_, k)| k.as_str())
                .chain(std::iter::once(key.as_str()))
                .collect::<Vec<_>>()
                .join(".");

            let value = strip_comment(rest.trim());
            if value.is_empty() {
                index.sections.entry(path).or_default().push(KeyOccurrence {
                    line,
                    value: String::new(),
                });
                stack.push((indent, key));
                continue;
            }

            if value.starts_with('|') || value.starts_with('>') {
                block_parent = Some(indent);
            }
            index.leaves.entry(path).or_default().push(KeyOccurrence {
                line,
                value: value.to_string(),
            });
        }

        index
    }

    /// Distinct leaf key paths, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.leaves.keys().map(String::as_str)
    }

    /// Number of distinct leaf key paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True if no leaf keys were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Distinct section paths, sorted.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Effective value of a leaf key: the last definition wins.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.occurrences(key).last().map(|o| o.value.as_str())
    }

    /// All definitions of a leaf key path.
    #[must_use]
    pub fn occurrences(&self, key: &str) -> &[KeyOccurrence] {
        self.leaves.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every leaf or section path defined more than once, sorted by path.
    #[must_use]
    pub fn duplicates(&self) -> Vec<DuplicateKey> {
        let leaves = self.leaves.iter().map(|(k, v)| (k, KeyKind::Leaf, v));
        let sections = self.sections.iter().map(|(k, v)| (k, KeyKind::Section, v));
        let mut dups: Vec<DuplicateKey> = leaves
            .chain(sections)
            .filter(|(_, _, occurrences)| occurrences.len() > 1)
            .map(|(key, kind, occurrences)| DuplicateKey {
                key: key.clone(),
                kind,
                occurrences: occurrences.clone(),
            })
            .collect();
        dups.sort_by(|a, b| a.key.cmp(&b.key).then(a.kind.cmp(&b.kind)));
        dups
    }
}

/// A key missing from the other file, with the value it has here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingKey {
    /// Dotted key path.
    pub key: String,
    /// Effective value in the file that has the key.
    pub value: String,
}

/// Key and section differences between two translation files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyComparison {
    /// Leaf keys present only in the left file.
    pub only_left: Vec<MissingKey>,
    /// Leaf keys present only in the right file.
    pub only_right: Vec<MissingKey>,
    /// Section paths present only in the left file.
    pub sections_only_left: Vec<String>,
    /// Section paths present only in the right file.
    pub sections_only_right: Vec<String>,
    /// Number of leaf keys present in both.
    pub common: usize,
}

/// Compare the leaf keys and section structure of two files.
#[must_use]
pub fn compare_keys(left: &KeyIndex, right: &KeyIndex) -> KeyComparison {
    let l: BTreeSet<&str> = left.keys().collect();
    let r: BTreeSet<&str> = right.keys().collect();
    let ls: BTreeSet<&str> = left.sections().collect();
    let rs: BTreeSet<&str> = right.sections().collect();

    KeyComparison {
        only_left: missing_from(l.difference(&r).copied(), left),
        only_right: missing_from(r.difference(&l).copied(), right),
        sections_only_left: ls.difference(&rs).map(ToString::to_string).collect(),
        sections_only_right: rs.difference(&ls).map(ToString::to_string).collect(),
        common: l.intersection(&r).count(),
    }
}

fn missing_from<'a>(keys: impl Iterator<Item = &'a str>, index: &KeyIndex) -> Vec<MissingKey> {
    keys.map(|key| MissingKey {
        key: key.to_string(),
        value: index.value(key).unwrap_or_default().to_string(),
    })
    .collect()
}

/// Split `key: rest`. Quoted keys may contain colons.
fn split_key(body: &str) -> Option<(String, &str)> {
    let (key, after) = match body.chars().next()? {
        quote @ ('\'' | '"') => {
            let (key, consumed) = read_quoted(body, quote)?;
            (key, body[consumed..].trim_start())
        }
        _ => {
            let colon = plain_key_end(body)?;
            (body[..colon].trim_end().to_string(), &body[colon..])
        }
    };
    let rest = after.strip_prefix(':')?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((key, rest))
}

/// Byte offset of the `:` ending a plain key.
fn plain_key_end(body: &str) -> Option<usize> {
    body.char_indices()
        .find(|&(i, c)| {
            c == ':'
                && body[i + 1..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace)
        })
        .map(|(i, _)| i)
}

/// Read a quoted scalar starting at `body[0]`; returns text and bytes consumed.
fn read_quoted(body: &str, quote: char) -> Option<(String, usize)> {
    let mut text = String::new();
    let mut chars = body.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if quote == '\'' && c == '\'' {
            if chars.peek().is_some_and(|&(_, n)| n == '\'') {
                chars.next();
                text.push('\'');
                continue;
            }
            return Some((text, i + 1));
        }
        if quote == '"' && c == '\\' {
            if let Some((_, escaped)) = chars.next() {
                text.push(escaped);
            }
            continue;
        }
        if quote == '"' && c == '"' {
            return Some((text, i + 1));
        }
        text.push(c);
    }
    None
}

/// Drop a trailing ` # comment` from an unquoted value.
fn strip_comment(value: &str) -> &str {
    if value.starts_with('\'') || value.starts_with('"') {
        return value;
    }
    value.find(" #").map_or(value, |i| value[..i].trim_end())
}
