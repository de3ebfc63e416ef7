//! The rewriter: a pure function from (content, rules) to [`RewriteResult`].
//!
//! Rules run in order and each one sees the output of the previous one.
//! Within a rule, matches are taken left to right from the text entering
//! that rule. A match is skipped (and not counted) when it is empty, its
//! guard rejects it, it cuts through a template tag, its lookup key is
//! unmapped, or its replacement equals the matched text.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::capture::{Substitution, substitute};
use crate::rule::{RewriteRule, RuleScope};
use crate::template::{cuts_span, template_spans};
use crate::types::{RewriteResult, RuleChange};

/// Apply `rules` to `content`. Nothing is written anywhere.
#[must_use]
pub fn apply(content: &str, rules: &[RewriteRule]) -> RewriteResult {
    let mut result = RewriteResult::unchanged(content);
    let mut unmapped = BTreeSet::new();

    for rule in rules {
        let mut budget = rule.limit();
        let (text, count) = match rule.scope() {
            RuleScope::Document => {
                let (text, count) = rewrite_unit(&result.content, rule, &mut budget, &mut unmapped);
                (text.into_owned(), count)
            }
            RuleScope::Line => rewrite_lines(&result.content, rule, &mut budget, &mut unmapped),
        };

        if count == 0 {
            continue;
        }
        result.content = text;
        result.change_count += count;
        result.changes.push(RuleChange {
            rule: rule.name().to_string(),
            description: rule.description().to_string(),
            count,
        });
    }

    result.modified = result.content != content;
    result.unmapped = unmapped.into_iter().collect();
    result
}

/// Apply a line-scoped rule. Terminators are copied through untouched.
fn rewrite_lines(
    text: &str,
    rule: &RewriteRule,
    budget: &mut Option<usize>,
    unmapped: &mut BTreeSet<String>,
) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;

    for line in text.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        let (new_body, n) = rewrite_unit(body, rule, budget, unmapped);
        out.push_str(&new_body);
        out.push_str(terminator);
        count += n;
    }

    (out, count)
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Apply one rule to one unit of text (a document or a line).
fn rewrite_unit<'t>(
    text: &'t str,
    rule: &RewriteRule,
    budget: &mut Option<usize>,
    unmapped: &mut BTreeSet<String>,
) -> (Cow<'t, str>, usize) {
    let spans = if rule.respects_template_tags() {
        template_spans(text)
    } else {
        Vec::new()
    };

    let mut out = String::new();
    let mut last = 0;
    let mut count = 0;

    for caps in rule.regex().captures_iter(text) {
        if *budget == Some(0) {
            break;
        }
        let Some(m) = caps.get(0) else { continue };
        if m.is_empty() || cuts_span(&spans, &m.range()) {
            continue;
        }
        if let Some(guard) = rule.guard()
            && !guard.allows(text, m.start(), m.end())
        {
            continue;
        }

        let replacement = match substitute(rule.replacement(), &caps) {
            Substitution::Text(replacement) => replacement,
            Substitution::Unmapped(key) => {
                unmapped.insert(key.to_string());
                continue;
            }
            Substitution::NoKey => continue,
        };
        if replacement == m.as_str() {
            continue;
        }

        out.push_str(&text[last..m.start()]);
        out.push_str(&replacement);
        last = m.end();
        count += 1;
        if let Some(remaining) = budget.as_mut() {
            *remaining -= 1;
        }
    }

    if count == 0 {
        return (Cow::Borrowed(text), 0);
    }
    out.push_str(&text[last..]);
    (Cow::Owned(out), count)
}
