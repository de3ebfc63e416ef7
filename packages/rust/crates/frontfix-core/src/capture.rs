//! Capture substitution for rule replacements.
//!
//! Handles both capture templates (`$1`, `${name}`) and table lookups
//! (`{value}` in the template is replaced by the table entry).

use regex::Captures;

use crate::rule::Replacement;

/// Placeholder for the looked-up value in lookup templates.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Outcome of substituting one match.
#[derive(Debug, PartialEq, Eq)]
pub enum Substitution<'h> {
    /// Replacement text for the match.
    Text(String),
    /// Lookup key had no table entry; the match is left alone.
    Unmapped(&'h str),
    /// Lookup key group did not participate in the match.
    NoKey,
}

/// Compute the replacement for one match.
#[must_use]
pub fn substitute<'h>(replacement: &Replacement, caps: &Captures<'h>) -> Substitution<'h> {
    match replacement {
        Replacement::Template(template) => {
            let mut out = String::new();
            caps.expand(template, &mut out);
            Substitution::Text(out)
        }
        Replacement::Lookup(lookup) => {
            let Some(key) = lookup.key_of(caps) else {
                return Substitution::NoKey;
            };
            let Some(value) = lookup.table.get(key) else {
                return Substitution::Unmapped(key);
            };
            let mut out = String::new();
            caps.expand(&lookup.template, &mut out);
            Substitution::Text(out.replace(VALUE_PLACEHOLDER, value))
        }
    }
}
