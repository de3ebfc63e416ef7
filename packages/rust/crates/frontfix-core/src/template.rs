//! Twig tag spans (`{% %}`, `{{ }}`, `{# #}`).
//!
//! Rules treat these spans as opaque: a match may contain a whole span or sit
//! entirely inside one, but it may not cut through a delimiter.

use std::ops::Range;

const DELIMITERS: [(&str, &str); 3] = [("{%", "%}"), ("{{", "}}"), ("{#", "#}")];

/// Byte ranges of all template tags in `text`, in document order.
///
/// An unterminated tag extends to the end of the text.
#[must_use]
pub fn template_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let rest = &text[start..];
        let Some((open, close)) = DELIMITERS.iter().find(|(open, _)| rest.starts_with(open)) else {
            pos = start + 1;
            continue;
        };
        let body = start + open.len();
        let end = text[body..]
            .find(close)
            .map_or(text.len(), |i| body + i + close.len());
        spans.push(start..end);
        pos = end;
    }

    spans
}

/// True if `range` partially overlaps any span.
#[must_use]
pub fn cuts_span(spans: &[Range<usize>], range: &Range<usize>) -> bool {
    let first = spans.partition_point(|s| s.end <= range.start);
    spans[first..]
        .iter()
        .take_while(|s| s.start < range.end)
        .any(|s| {
            let contains_span = range.start <= s.start && s.end <= range.end;
            let inside_span = s.start <= range.start && range.end <= s.end;
            !contains_span && !inside_span
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_all_tag_kinds() {
        let text = "{% if a %}<b>{{ a }}</b>{# note #}{% endif %}";
        let spans = template_spans(text);
        let found: Vec<&str> = spans.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(found, ["{% if a %}", "{{ a }}", "{# note #}", "{% endif %}"]);
    }

    #[test]
    fn test_plain_braces_ignored() {
        assert!(template_spans(".a { color: red; }").is_empty());
    }

    #[test]
    fn test_unterminated_runs_to_end() {
        let text = "<p>{{ broken";
        assert_eq!(template_spans(text), vec![3..text.len()]);
    }

    #[test]
    fn test_cuts_span() {
        let text = "<i class=\"{{ cls }}\">";
        let spans = template_spans(text);
        // whole span inside the match
        assert!(!cuts_span(&spans, &(0..text.len())));
        // match inside the span
        assert!(!cuts_span(&spans, &(13..16)));
        // match crossing the closing delimiter
        assert!(cuts_span(&spans, &(13..20)));
        // disjoint
        assert!(!cuts_span(&spans, &(0..2)));
    }
}
