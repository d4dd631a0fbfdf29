/// Priority marker extraction: `!low`, `!medium`, `!high`, case-insensitive,
/// bounded by whitespace or string edges. First match wins; later duplicates
/// are ignored and left in place.
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{at_token_boundary, ends_at_boundary};
use crate::types::Priority;

static PRIORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)!(low|medium|high)").expect("valid priority regex"));

pub fn extract_priority(text: &str) -> Option<(Priority, Range<usize>)> {
    for caps in PRIORITY_RE.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        if !at_token_boundary(text, whole.start()) || !ends_at_boundary(text, whole.end()) {
            continue;
        }
        let priority = match caps[1].to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            _ => Priority::Low,
        };
        return Some((priority, whole.range()));
    }
    None
}
