//! Rule sets and YAML rule files.
//!
//! A rule file holds an ordered `rules` list and the lookup `tables` those
//! rules reference. Tables are configuration data: loaded once, shared
//! read-only by every rule that names them. Every pattern is compiled here,
//! so a broken rule file fails before any file I/O starts.
//!
//! ```yaml
//! name: icons
//! rules:
//!   - name: fa-classes
//!     pattern: '\bfa-[a-z0-9-]+'
//!     lookup: { table: icons }
//! tables:
//!   icons: { fa-cog: bi-gear }
//!   more: { file: extra-icons.yaml }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::capture::VALUE_PLACEHOLDER;
use crate::error::EngineError;
use crate::rule::{
    DEFAULT_GUARD_WINDOW, GuardMode, GuardSide, LookupTable, RewriteRule, RuleScope,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    rules: Vec<RuleSpec>,
    #[serde(default)]
    tables: BTreeMap<String, TableSource>,
}

/// One rule as written in a rule file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec {
    name: String,
    #[serde(default)]
    description: Option<String>,
    pattern: String,
    #[serde(default)]
    replacement: Option<String>,
    #[serde(default)]
    lookup: Option<LookupSpec>,
    #[serde(default)]
    guard: Option<GuardSpec>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    scope: RuleScope,
    #[serde(default = "default_true")]
    respect_template_tags: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LookupSpec {
    table: String,
    #[serde(default = "default_key")]
    key: String,
    #[serde(default = "default_template")]
    template: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GuardSpec {
    pattern: String,
    #[serde(default)]
    mode: GuardMode,
    #[serde(default)]
    side: GuardSide,
    #[serde(default = "default_window")]
    window: usize,
}

/// Where a lookup table comes from. A mapping with a `file` key is a file
/// reference, anything else is an inline table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableSource {
    File { file: PathBuf },
    Inline(Value),
}

fn default_true() -> bool {
    true
}

fn default_key() -> String {
    "0".to_string()
}

fn default_template() -> String {
    VALUE_PLACEHOLDER.to_string()
}

fn default_window() -> usize {
    DEFAULT_GUARD_WINDOW
}

/// Flatten a YAML mapping into dotted key paths (`nav.title`).
///
/// Nested mappings become path segments; scalar leaves become values.
/// Sequences and nulls are skipped.
///
/// # Errors
/// `EngineError::Config` if `value` is not a mapping.
pub fn flatten_table(value: &Value) -> Result<LookupTable, EngineError> {
    let Value::Mapping(_) = value else {
        return Err(EngineError::Config("lookup table must be a mapping".to_string()));
    };
    let mut table = LookupTable::new();
    flatten_into(value, "", &mut table);
    Ok(table)
}

fn flatten_into(value: &Value, prefix: &str, table: &mut LookupTable) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let Some(key) = scalar_to_string(key) else {
                    continue;
                };
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, &path, table);
            }
        }
        other => {
            if let Some(leaf) = scalar_to_string(other) {
                table.insert(prefix.to_string(), leaf);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn load_table(
    name: &str,
    source: TableSource,
    base_dir: &Path,
) -> Result<LookupTable, EngineError> {
    let value = match source {
        TableSource::Inline(value) => value,
        TableSource::File { file } => {
            let path = base_dir.join(file);
            let text = fs::read_to_string(&path).map_err(|e| {
                EngineError::Config(format!(
                    "table '{name}': cannot read {}: {e}",
                    path.display()
                ))
            })?;
            serde_yaml::from_str(&text).map_err(|e| {
                EngineError::Config(format!("table '{name}': {}: {e}", path.display()))
            })?
        }
    };
    flatten_table(&value).map_err(|e| EngineError::Config(format!("table '{name}': {e}")))
}

fn compile_rule(
    spec: RuleSpec,
    tables: &BTreeMap<String, Arc<LookupTable>>,
) -> Result<RewriteRule, EngineError> {
    let rule = match (spec.replacement, spec.lookup) {
        (Some(replacement), None) => RewriteRule::new(&spec.name, &spec.pattern, replacement)?,
        (None, Some(lookup)) => {
            let table = tables.get(&lookup.table).ok_or_else(|| {
                EngineError::Config(format!(
                    "rule '{}' references unknown table '{}'",
                    spec.name, lookup.table
                ))
            })?;
            RewriteRule::lookup(
                &spec.name,
                &spec.pattern,
                Arc::clone(table),
                lookup.key,
                lookup.template,
            )?
        }
        _ => {
            return Err(EngineError::Config(format!(
                "rule '{}' needs exactly one of `replacement` or `lookup`",
                spec.name
            )));
        }
    };

    let mut rule = rule
        .with_scope(spec.scope)
        .with_template_tags(spec.respect_template_tags);
    if let Some(description) = spec.description {
        rule = rule.with_description(description);
    }
    if let Some(guard) = spec.guard {
        rule = rule.with_guard(&guard.pattern, guard.mode, guard.side, guard.window)?;
    }
    if let Some(limit) = spec.limit {
        rule = rule.with_limit(limit);
    }
    Ok(rule)
}

/// An ordered, compiled, immutable sequence of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
    sources: Vec<String>,
}

impl RuleSet {
    /// Build a rule set from already compiled rules.
    ///
    /// # Errors
    /// `EngineError::Config` if two rules share a name.
    pub fn new(rules: Vec<RewriteRule>) -> Result<Self, EngineError> {
        let set = Self {
            rules,
            sources: Vec::new(),
        };
        set.check_unique_names()?;
        Ok(set)
    }

    /// Parse a rule file. Table `file` references resolve against `base_dir`.
    ///
    /// # Errors
    /// `Config` for malformed YAML, bad table references or duplicate rule
    /// names; `Pattern` for patterns that fail to compile.
    pub fn from_yaml_str(yaml: &str, base_dir: &Path) -> Result<Self, EngineError> {
        let file: RuleFile =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(e.to_string()))?;

        let mut tables = BTreeMap::new();
        for (name, source) in file.tables {
            let table = load_table(&name, source, base_dir)?;
            debug!(table = %name, entries = table.len(), "loaded lookup table");
            tables.insert(name, Arc::new(table));
        }

        let rules = file
            .rules
            .into_iter()
            .map(|spec| compile_rule(spec, &tables))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = Self::new(rules)?;
        if let Some(name) = file.name {
            set.sources.push(match file.description {
                Some(description) => format!("{name}: {description}"),
                None => name,
            });
        }
        Ok(set)
    }

    /// Load one rule file from disk.
    ///
    /// # Errors
    /// Same as [`RuleSet::from_yaml_str`], plus `Config` if unreadable.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read rule file {}: {e}", path.display()))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut set = Self::from_yaml_str(&text, base_dir).map_err(|e| match e {
            EngineError::Config(msg) => {
                EngineError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        if set.sources.is_empty() {
            set.sources.push(path.display().to_string());
        }
        Ok(set)
    }

    /// Load and concatenate several rule files, in order.
    ///
    /// # Errors
    /// The first load failure, or `Config` for rule names repeated across files.
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, EngineError> {
        let mut combined = Self::default();
        for path in paths {
            let set = Self::load(path.as_ref())?;
            combined.rules.extend(set.rules);
            combined.sources.extend(set.sources);
        }
        combined.check_unique_names()?;
        Ok(combined)
    }

    fn check_unique_names(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name()) {
                return Err(EngineError::Config(format!(
                    "duplicate rule name '{}'",
                    rule.name()
                )));
            }
        }
        Ok(())
    }

    /// Rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rule file names (or descriptions) this set was loaded from.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply;

    const ICONS: &str = r"
name: icons
rules:
  - name: fa-style
    pattern: '\b(?:fas|far|fab)\s+'
    replacement: 'bi '
  - name: fa-icons
    description: Map FontAwesome icons to Bootstrap Icons
    pattern: '\bfa-[a-z0-9-]+'
    lookup: { table: icons }
tables:
  icons:
    fa-cog: bi-gear
    fa-home: bi-house
";

    #[test]
    fn test_parse_and_apply() {
        let set = RuleSet::from_yaml_str(ICONS, Path::new(".")).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sources(), ["icons"]);

        let result = apply(r#"<i class="fas fa-cog"></i><i class="far fa-rocket">"#, set.rules());
        assert_eq!(
            result.content,
            r#"<i class="bi bi-gear"></i><i class="bi fa-rocket">"#
        );
        assert_eq!(result.unmapped, ["fa-rocket"]);
        assert_eq!(result.changes[1].description, "Map FontAwesome icons to Bootstrap Icons");
    }

    #[test]
    fn test_guard_and_scope_fields() {
        let yaml = r"
rules:
  - name: headings
    pattern: '<h2>'
    replacement: '<h3>'
    guard: { pattern: card-header, window: 40 }
    limit: 2
    scope: line
    respect_template_tags: false
";
        let set = RuleSet::from_yaml_str(yaml, Path::new(".")).unwrap();
        let rule = &set.rules()[0];
        assert_eq!(rule.limit(), Some(2));
        assert_eq!(rule.scope(), RuleScope::Line);
        assert!(!rule.respects_template_tags());
        assert!(rule.guard().is_some());
    }

    #[test]
    fn test_bad_pattern_fails_fast() {
        let yaml = "rules:\n  - name: broken\n    pattern: '(unclosed'\n    replacement: x\n";
        let err = RuleSet::from_yaml_str(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, EngineError::Pattern { .. }));
    }

    #[test]
    fn test_both_replacement_and_lookup_rejected() {
        let yaml = r"
rules:
  - name: both
    pattern: x
    replacement: y
    lookup: { table: t }
tables:
  t: { x: z }
";
        let err = RuleSet::from_yaml_str(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_unknown_table_rejected() {
        let yaml = "rules:\n  - name: r\n    pattern: x\n    lookup: { table: missing }\n";
        let err = RuleSet::from_yaml_str(yaml, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("unknown table 'missing'"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = "rules:\n  - { name: r, pattern: a, replacement: b }\n  - { name: r, pattern: c, replacement: d }\n";
        assert!(RuleSet::from_yaml_str(yaml, Path::new(".")).is_err());
    }

    #[test]
    fn test_flatten_nested_table() {
        let value: Value = serde_yaml::from_str("nav:\n  title: Navigation\n  count: 3\nok: true\n").unwrap();
        let table = flatten_table(&value).unwrap();
        assert_eq!(table.get("nav.title").map(String::as_str), Some("Navigation"));
        assert_eq!(table.get("nav.count").map(String::as_str), Some("3"));
        assert_eq!(table.get("ok").map(String::as_str), Some("true"));
    }
}
