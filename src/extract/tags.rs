/// Hashtag extraction.
///
/// A tag is `#` followed by letters, digits, `_`, `-`, or `/`, with at
/// least one non-digit in the name (`#123` is a reference, not a tag).
/// Punctuation stuck to the end of a tag is treated as accidental noise and
/// stripped from the display title regardless of the move setting.
/// Duplicate tags (case-insensitive) collapse to the first occurrence,
/// whose original casing survives in the metadata; the duplicates
/// themselves are always stripped from the display title, the first
/// occurrence only when tag-moving is enabled.
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{at_token_boundary, TRAILING_NOISE};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z0-9_/-]+").expect("valid tag regex"));

/// First occurrence of a tag, with its trailing punctuation noise (empty
/// range when there is none) reported separately.
#[derive(Debug, Clone, PartialEq)]
pub struct TagSpan {
    pub tag: Range<usize>,
    pub trailing_noise: Range<usize>,
}

#[derive(Debug, Default)]
pub struct TagMatches {
    /// Canonical tag list, leading `#` included, first-occurrence casing.
    pub tags: Vec<String>,
    /// First occurrences (tag removed only when tags are moved, noise
    /// always).
    pub keeps: Vec<TagSpan>,
    /// Spans of duplicate occurrences, noise included (always removed).
    pub dup_spans: Vec<Range<usize>>,
}

pub fn extract_tags(text: &str) -> TagMatches {
    let mut matches = TagMatches::default();
    let mut seen: Vec<String> = Vec::new();

    for found in TAG_RE.find_iter(text) {
        if !at_token_boundary(text, found.start()) {
            continue;
        }
        let name = &found.as_str()[1..];
        if name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        // Swallow trailing punctuation noise into the span.
        let mut end = found.end();
        while let Some(next) = text[end..].chars().next() {
            if TRAILING_NOISE.contains(&next) {
                end += next.len_utf8();
            } else {
                break;
            }
        }

        let folded = found.as_str().to_lowercase();
        if seen.contains(&folded) {
            matches.dup_spans.push(found.start()..end);
        } else {
            seen.push(folded);
            matches.tags.push(found.as_str().to_string());
            matches.keeps.push(TagSpan {
                tag: found.range(),
                trailing_noise: found.end()..end,
            });
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tags() {
        let matches = extract_tags("fix roof #home #urgent/now");
        assert_eq!(matches.tags, vec!["#home", "#urgent/now"]);
        assert_eq!(matches.dup_spans.len(), 0);
    }

    #[test]
    fn test_case_insensitive_dedup_keeps_first_casing() {
        let matches = extract_tags("buy milk #errand #Errand #errand");
        assert_eq!(matches.tags, vec!["#errand"]);
        assert_eq!(matches.keeps.len(), 1);
        assert_eq!(matches.dup_spans.len(), 2);
    }

    #[test]
    fn test_trailing_noise_reported_separately() {
        let text = "done #review, next";
        let matches = extract_tags(text);
        assert_eq!(matches.tags, vec!["#review"]);
        assert_eq!(&text[matches.keeps[0].tag.clone()], "#review");
        assert_eq!(&text[matches.keeps[0].trailing_noise.clone()], ",");
    }

    #[test]
    fn test_numeric_only_is_not_a_tag() {
        let matches = extract_tags("see #123 for details");
        assert!(matches.tags.is_empty());
    }

    #[test]
    fn test_mid_word_hash_is_not_a_tag() {
        let matches = extract_tags("c#sharp and issue#42x");
        assert!(matches.tags.is_empty());
    }
}
