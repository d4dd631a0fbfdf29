/// Token micro-extractors.
///
/// Each extractor scans a title string (usually the deletion editor's
/// masked working view) against a byte-offset window and reports what it
/// found plus the span it matched; it never mutates the text itself. The
/// item hydrator applies them in a fixed precedence order: date+time,
/// standalone time, priority, tags, assigned members, inline fields.
pub mod date;
pub mod fields;
pub mod members;
pub mod priority;
pub mod tags;

/// Punctuation that reads as accidental noise when stuck to the end of a
/// tag or member token.
pub(crate) const TRAILING_NOISE: &[char] =
    &[',', '.', ';', ':', '!', '?', ')', ']', '\'', '"'];

/// A token only counts when it sits at the start of the string or right
/// after whitespace; mid-word sigils are ordinary text.
pub(crate) fn at_token_boundary(text: &str, start: usize) -> bool {
    start == 0
        || text[..start]
            .chars()
            .next_back()
            .map(char::is_whitespace)
            .unwrap_or(true)
}

/// Whitespace or end-of-string after a token.
pub(crate) fn ends_at_boundary(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .map(char::is_whitespace)
        .unwrap_or(true)
}
