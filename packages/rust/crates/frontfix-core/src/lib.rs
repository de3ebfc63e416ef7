#![allow(clippy::doc_markdown)]

//! frontfix-core - Batch text rewrites for Twig, CSS and YAML maintenance
//!
//! Applies ordered, named regex rules to a file tree, one file at a time,
//! then checks the result and reports what changed.
//!
//! # Features
//!
//! - **Rule Sets**: YAML rule files with capture templates and lookup tables
//! - **Context Guards**: Require or forbid a pattern near each match
//! - **Template Safety**: Twig `{{ }}`, `{% %}` and `{# #}` spans are never cut
//! - **Dry Run**: Same pipeline, nothing persisted
//! - **Validation**: Open/close balance of structural tags after each rewrite
//! - **Audits**: Duplicate translation keys, key drift, hardcoded text, `|trans` usage
//!
//! # Architecture
//!
//! ```text
//! frontfix-core/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # IoError, EngineError (thiserror)
//! ├── io.rs           # Strict UTF-8 reads, backups, writes
//! ├── types.rs        # RewriteResult, RuleChange
//! ├── rule.rs         # RewriteRule, ContextGuard, Replacement
//! ├── capture.rs      # $1 / ${name} / {value} substitution
//! ├── template.rs     # Twig span detection
//! ├── rewriter.rs     # apply(): ordered rules over one document
//! ├── ruleset.rs      # RuleSet, YAML rule files
//! ├── resolver.rs     # File set resolution (walkdir + globset)
//! ├── validate.rs     # Structural tag balance
//! ├── diff.rs         # Unified diff previews
//! ├── report.rs       # RunReport (text / JSON)
//! ├── engine.rs       # Engine: resolve -> rewrite -> persist -> validate
//! ├── config.rs       # frontfix.yaml
//! ├── translations.rs # Translation key audit
//! └── classify.rs     # Hardcoded text and `|trans` audit
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use frontfix_core::{Engine, ResolveOptions, RewriteRule, RuleSet, RunOptions};
//!
//! let rule = RewriteRule::new("h2-h3", r"<h2>(.*?)</h2>", "<h3>$1</h3>")?;
//! let rules = RuleSet::new(vec![rule])?;
//!
//! let report = Engine::new(rules, RunOptions { dry_run: true, ..Default::default() })
//!     .run(&ResolveOptions::default())?;
//! println!("{}", report.render_text());
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod capture;
mod classify;
mod config;
mod diff;
mod engine;
mod error;
mod io;
mod report;
mod resolver;
mod rewriter;
mod rule;
mod ruleset;
mod template;
mod translations;
mod types;
mod validate;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use error::{EngineError, IoError};
pub use types::{RewriteResult, RuleChange, content_hash};

// Rules and the single-document rewrite
pub use capture::VALUE_PLACEHOLDER;
pub use rewriter::apply;
pub use rule::{
    ContextGuard, DEFAULT_GUARD_WINDOW, GuardMode, GuardSide, Lookup, LookupTable, Replacement,
    RewriteRule, RuleScope,
};
pub use ruleset::{RuleSet, flatten_table};
pub use template::template_spans;

// Batch runs
pub use config::{DEFAULT_CONFIG_FILE, FrontfixConfig};
pub use diff::unified_diff;
pub use engine::{Engine, RunOptions};
pub use io::{backup_path, read_text};
pub use report::{FileFailure, FileSummary, RunReport, WARN_MARKER};
pub use resolver::{FileCandidate, ResolveOptions, ResolvedFiles, resolve_files};
pub use validate::{DEFAULT_STRUCTURAL_TAGS, ValidationIssue, validate, validate_change};

// Audits
pub use classify::{
    AuditReport, DEFAULT_INDICATORS, FileFindings, FindingKind, TRANSLATABLE_ATTRIBUTES,
    TextClassifier, TextFinding, WordListClassifier, audit_files, audit_template,
    find_hardcoded_text, find_trans_issues,
};
pub use translations::{
    DuplicateKey, KeyComparison, KeyIndex, KeyKind, KeyOccurrence, MissingKey, compare_keys,
};
