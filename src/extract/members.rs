/// Assigned-member extraction: `@@name` tokens, no whitespace in the name.
/// Trailing punctuation is treated as noise: it is trimmed off the stored
/// name but stays inside the removal span. Every occurrence is collected
/// (deduped, order preserved) and every occurrence's span is reported for
/// removal from the display title.
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{at_token_boundary, TRAILING_NOISE};

// `@@{...}` is a time token, so a member name may not open with a brace.
static MEMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@([^\s{][^\s]*)").expect("valid member regex"));

pub fn extract_members(text: &str) -> (Vec<String>, Vec<Range<usize>>) {
    let mut members: Vec<String> = Vec::new();
    let mut spans = Vec::new();

    for caps in MEMBER_RE.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        if !at_token_boundary(text, whole.start()) {
            continue;
        }
        let name = caps[1].trim_end_matches(TRAILING_NOISE);
        if name.is_empty() {
            continue;
        }
        if !members.iter().any(|member| member == name) {
            members.push(name.to_string());
        }
        spans.push(whole.range());
    }

    (members, spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_occurrences() {
        let (members, spans) = extract_members("review @@ana then ping @@ben @@ana");
        assert_eq!(members, vec!["ana", "ben"]);
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn test_time_token_is_not_a_member() {
        let (members, _) = extract_members("standup @@{09:30}");
        assert!(members.is_empty());
    }

    #[test]
    fn test_trailing_punctuation_is_not_part_of_the_name() {
        let text = "ping @@ana, then @@ben.";
        let (members, spans) = extract_members(text);
        assert_eq!(members, vec!["ana", "ben"]);
        // The noise still belongs to the removal span.
        assert_eq!(&text[spans[0].clone()], "@@ana,");
    }

    #[test]
    fn test_mid_word_is_not_a_member() {
        let (members, _) = extract_members("mail a@@b.example");
        assert!(members.is_empty());
    }
}
