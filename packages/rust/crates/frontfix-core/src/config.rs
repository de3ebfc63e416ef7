//! Project configuration (`frontfix.yaml`).
//!
//! Every field is optional. Relative paths in the file resolve against the
//! directory containing it. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::RunOptions;
use crate::error::EngineError;
use crate::resolver::ResolveOptions;
use crate::validate::DEFAULT_STRUCTURAL_TAGS;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "frontfix.yaml";

/// Settings shared by all subcommands.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontfixConfig {
    /// Directory to scan.
    pub root: PathBuf,
    /// Accepted file-name suffixes.
    pub extensions: Vec<String>,
    /// Exclusion globs, relative to the root.
    pub exclude: Vec<String>,
    /// Directory names skipped anywhere.
    pub skip_dirs: Vec<String>,
    /// Suffix for backup copies (also excluded from scans).
    pub backup_suffix: String,
    /// Tags checked for open/close balance.
    pub structural_tags: Vec<String>,
    /// Per-file size limit in bytes.
    pub max_file_size: u64,
    /// Rule files used when `--rules` is not given.
    pub rules: Vec<PathBuf>,
    /// Word list for the hardcoded text audit (one word per line).
    pub words: Option<PathBuf>,
    /// Known translation domains. Empty accepts any domain.
    pub domains: Vec<String>,
    /// Check tag balance in files the rules left unchanged too.
    pub validate_all: bool,
}

impl Default for FrontfixConfig {
    fn default() -> Self {
        let resolve = ResolveOptions::default();
        Self {
            root: resolve.root,
            extensions: resolve.extensions,
            exclude: resolve.exclude,
            skip_dirs: resolve.skip_dirs,
            backup_suffix: resolve.backup_suffix,
            structural_tags: DEFAULT_STRUCTURAL_TAGS.iter().map(ToString::to_string).collect(),
            max_file_size: RunOptions::default().max_file_size,
            rules: Vec::new(),
            words: None,
            domains: Vec::new(),
            validate_all: false,
        }
    }
}

impl FrontfixConfig {
    /// Parse config YAML; relative paths resolve against `base_dir`.
    ///
    /// # Errors
    /// `EngineError::Config` for malformed YAML or unknown keys.
    pub fn from_yaml_str(yaml: &str, base_dir: &Path) -> Result<Self, EngineError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(e.to_string()))?
        };
        config.root = base_dir.join(&config.root);
        config.rules = config.rules.iter().map(|p| base_dir.join(p)).collect();
        config.words = config.words.map(|p| base_dir.join(p));
        Ok(config)
    }

    /// Load a config file.
    ///
    /// # Errors
    /// `EngineError::Config` if unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {e}", path.display())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml_str(&text, base_dir)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `explicit` if given (it must exist), else `frontfix.yaml` in the
    /// working directory if present, else defaults.
    ///
    /// # Errors
    /// `EngineError::Config` if the chosen file is unreadable or malformed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, EngineError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// File resolution settings derived from this config.
    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            root: self.root.clone(),
            extensions: self.extensions.clone(),
            exclude: self.exclude.clone(),
            skip_dirs: self.skip_dirs.clone(),
            backup_suffix: self.backup_suffix.clone(),
            target: None,
        }
    }

    /// Run settings derived from this config.
    #[must_use]
    pub fn run_options(&self, dry_run: bool, backup: bool) -> RunOptions {
        RunOptions {
            dry_run,
            backup_suffix: backup.then(|| self.backup_suffix.clone()),
            structural_tags: self.structural_tags.clone(),
            max_file_size: self.max_file_size,
            validate_unchanged: self.validate_all,
            ..RunOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FrontfixConfig::from_yaml_str("", Path::new("")).unwrap();
        assert_eq!(config.root, PathBuf::from("templates"));
        assert_eq!(config.extensions, [".twig"]);
        assert_eq!(config.backup_suffix, ".bak");
        assert!(config.structural_tags.iter().any(|t| t == "h1"));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let yaml = "root: templates\nrules: [rules/icons.yaml]\nwords: words.txt\nextensions: [twig, css]\n";
        let config = FrontfixConfig::from_yaml_str(yaml, Path::new("/srv/app")).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/app/templates"));
        assert_eq!(config.rules, [PathBuf::from("/srv/app/rules/icons.yaml")]);
        assert_eq!(config.words, Some(PathBuf::from("/srv/app/words.txt")));
        assert_eq!(config.extensions, ["twig", "css"]);
    }

    #[test]
    fn test_domains_and_validate_all() {
        let yaml = "domains: [messages, asset]\nvalidate_all: true\n";
        let config = FrontfixConfig::from_yaml_str(yaml, Path::new("")).unwrap();
        assert_eq!(config.domains, ["messages", "asset"]);
        assert!(config.run_options(true, false).validate_unchanged);
        assert!(!FrontfixConfig::default().run_options(true, false).validate_unchanged);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FrontfixConfig::from_yaml_str("roots: x\n", Path::new("")).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_run_options_backup_toggle() {
        let config = FrontfixConfig::default();
        assert_eq!(config.run_options(false, true).backup_suffix.as_deref(), Some(".bak"));
        assert!(config.run_options(true, false).backup_suffix.is_none());
    }
}
