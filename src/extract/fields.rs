/// Inline `key::value` field extraction.
///
/// A value runs until the next field on the same line or end of line. A
/// reserved subset of keys ("task fields") is distinguished from general
/// fields: its move-eligibility is governed by `move-task-metadata` rather
/// than `inline-metadata-position`, and only fields on the first line are
/// eligible for the carve-out.
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::at_token_boundary;

static FIELD_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z][A-Za-z0-9_-]*)::").expect("valid field key regex"));

/// Reserved task-field keys, compared case-insensitively.
pub const TASK_FIELD_KEYS: &[&str] =
    &["start", "scheduled", "due", "created", "completion", "repeat"];

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub key: String,
    /// Value as it reads in the scanned text. When scanning a masked
    /// working view, callers should re-read the value through
    /// `DeletionEditor::restore(value_span)` instead.
    pub value: String,
    pub task_field: bool,
    pub span: Range<usize>,
    /// The value portion of `span` (everything after the `key::` marker).
    pub value_span: Range<usize>,
}

pub fn is_task_field(key: &str) -> bool {
    TASK_FIELD_KEYS
        .iter()
        .any(|reserved| key.eq_ignore_ascii_case(reserved))
}

pub fn extract_fields(text: &str) -> Vec<FieldMatch> {
    let mut fields = Vec::new();
    let mut line_start = 0;

    for (line_index, line) in text.split('\n').enumerate() {
        let keys: Vec<(Range<usize>, String)> = FIELD_KEY_RE
            .captures_iter(line)
            .filter(|caps| {
                at_token_boundary(line, caps.get(0).expect("capture 0").start())
            })
            .map(|caps| {
                (
                    caps.get(0).expect("capture 0").range(),
                    caps[1].to_string(),
                )
            })
            .collect();

        for (i, (key_span, key)) in keys.iter().enumerate() {
            let value_end = keys
                .get(i + 1)
                .map(|(next, _)| next.start)
                .unwrap_or(line.len());
            let raw_value = &line[key_span.end..value_end];
            let value = raw_value.trim();
            let span_end = key_span.end + raw_value.trim_end().len();
            fields.push(FieldMatch {
                key: key.clone(),
                value: value.to_string(),
                task_field: line_index == 0 && is_task_field(key),
                span: (line_start + key_span.start)..(line_start + span_end),
                value_span: (line_start + key_span.end)..(line_start + span_end),
            });
        }

        line_start += line.len() + 1;
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field() {
        let text = "order parts vendor:: acme corp";
        let fields = extract_fields(text);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "vendor");
        assert_eq!(fields[0].value, "acme corp");
        assert!(!fields[0].task_field);
        assert_eq!(&text[fields[0].span.clone()], "vendor:: acme corp");
        assert_eq!(&text[fields[0].value_span.clone()], " acme corp");
    }

    #[test]
    fn test_value_runs_to_next_field() {
        let fields = extract_fields("due:: 2024-01-05 effort:: 3d");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, "2024-01-05");
        assert_eq!(fields[1].value, "3d");
    }

    #[test]
    fn test_task_field_only_on_first_line() {
        let fields = extract_fields("fix sink due:: 2024-01-05\nnotes\ndue:: later");
        assert_eq!(fields.len(), 2);
        assert!(fields[0].task_field);
        assert!(!fields[1].task_field);
    }

    #[test]
    fn test_url_is_not_a_field() {
        let fields = extract_fields("see https://example.com/page");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_mid_word_key_is_not_a_field() {
        let fields = extract_fields("weird::nested token x:y::z");
        // "weird" opens the line, so it is a field; "y" is glued to "x:" and
        // is not.
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "weird");
        assert_eq!(fields[0].value, "nested token x:y::z");
    }
}
