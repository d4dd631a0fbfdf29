/// Deferred-deletion text editor.
///
/// Several extractors run over the same original byte offsets in sequence;
/// deleting a span immediately would invalidate offsets computed by
/// extractors that have not run yet. Instead, marked spans are masked in a
/// working copy with placeholder spaces of equal byte length (so later
/// extractors neither re-match the content nor see shifted offsets) and all
/// removals are applied to the original string in one final pass.
use std::ops::Range;

/// Tracks spans of an original string marked for removal.
pub struct DeletionEditor {
    original: String,
    working: String,
    deletions: Vec<Range<usize>>,
}

impl DeletionEditor {
    pub fn new(text: &str) -> Self {
        Self {
            original: text.to_string(),
            working: text.to_string(),
            deletions: Vec::new(),
        }
    }

    /// The masked view later extractors scan. Same length as the original;
    /// marked spans read as spaces.
    pub fn working(&self) -> &str {
        &self.working
    }

    /// Mark a span for removal from the final text. Also masks it.
    pub fn mark(&mut self, span: Range<usize>) {
        let span = self.clamp(span);
        if span.is_empty() {
            return;
        }
        self.mask(span.clone());
        self.deletions.push(span);
    }

    /// Mask a span in the working view without removing it from the final
    /// text. Used for tokens that are extracted but not moved: later
    /// extractors must not re-match them, but the display title keeps them.
    pub fn mask(&mut self, span: Range<usize>) {
        let span = self.clamp(span);
        if span.is_empty() {
            return;
        }
        // Byte-for-byte replacement keeps every offset valid; replacing
        // whole chars with ASCII spaces keeps the string valid UTF-8.
        let blank = " ".repeat(span.len());
        self.working.replace_range(span, &blank);
    }

    /// Remove all marked spans from the original text. Spans are merged and
    /// applied right-to-left so earlier offsets stay valid throughout. A
    /// removal that leaves a doubled space at the seam drops one of them,
    /// and each line is trimmed.
    pub fn apply(self) -> String {
        if self.deletions.is_empty() {
            return self.original;
        }

        let mut spans = self.deletions;
        spans.sort_by_key(|span| span.start);
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => {
                    last.end = last.end.max(span.end);
                }
                _ => merged.push(span),
            }
        }

        let mut out = self.original;
        for span in merged.into_iter().rev() {
            let left_space = span.start > 0 && out.as_bytes()[span.start - 1] == b' ';
            let right_space = span.end < out.len() && out.as_bytes()[span.end] == b' ';
            let mut span = span;
            if left_space && right_space {
                span.end += 1;
            }
            out.replace_range(span, "");
        }

        out.lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Original text of `span` with the marked-for-removal subranges cut
    /// out. Masked-only content is restored verbatim; this is how consumers
    /// read a region without mask artifacts.
    pub fn restore(&self, span: Range<usize>) -> String {
        let span = self.clamp(span);
        let mut cuts: Vec<Range<usize>> = self
            .deletions
            .iter()
            .filter(|d| d.start < span.end && d.end > span.start)
            .cloned()
            .collect();
        cuts.sort_by_key(|cut| cut.start);

        let mut out = String::new();
        let mut cursor = span.start;
        for cut in cuts {
            let cut_start = cut.start.max(cursor);
            if cut_start > cursor {
                out.push_str(&self.original[cursor..cut_start]);
            }
            cursor = cursor.max(cut.end.min(span.end));
        }
        if cursor < span.end {
            out.push_str(&self.original[cursor..span.end]);
        }
        out
    }

    /// Whether any span has been marked for removal.
    pub fn is_dirty(&self) -> bool {
        !self.deletions.is_empty()
    }

    fn clamp(&self, mut span: Range<usize>) -> Range<usize> {
        span.end = span.end.min(self.original.len());
        span.start = span.start.min(span.end);
        while span.start < span.end && !self.original.is_char_boundary(span.start) {
            span.start += 1;
        }
        while span.end > span.start && !self.original.is_char_boundary(span.end) {
            span.end -= 1;
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_does_not_shift_offsets() {
        let text = "alpha beta gamma";
        let mut editor = DeletionEditor::new(text);
        editor.mark(0..5);
        // Working view keeps its length; "beta" is still at 6..10.
        assert_eq!(editor.working().len(), text.len());
        assert_eq!(&editor.working()[6..10], "beta");
        editor.mark(6..10);
        assert_eq!(editor.apply(), "gamma");
    }

    #[test]
    fn test_interior_removal_collapses_seam() {
        let mut editor = DeletionEditor::new("a !high b");
        editor.mark(2..7);
        assert_eq!(editor.apply(), "a b");
    }

    #[test]
    fn test_overlapping_spans_merge() {
        let mut editor = DeletionEditor::new("0123456789");
        editor.mark(2..6);
        editor.mark(4..8);
        assert_eq!(editor.apply(), "0189");
    }

    #[test]
    fn test_mask_keeps_text_in_output() {
        let mut editor = DeletionEditor::new("keep @{2024-01-01} this");
        editor.mask(5..18);
        // Masked region is invisible to later scans...
        assert!(!editor.working().contains("2024"));
        editor.mark(19..23);
        // ...but still present in the final text.
        assert_eq!(editor.apply(), "keep @{2024-01-01}");
    }

    #[test]
    fn test_restore_keeps_masked_text_and_drops_marked() {
        let mut editor = DeletionEditor::new("note:: see #ref @{2024} end");
        editor.mask(11..15);
        editor.mark(16..23);
        assert!(!editor.working().contains("#ref"));
        assert_eq!(editor.restore(7..27), "see #ref  end");
    }

    #[test]
    fn test_no_marks_is_identity() {
        let editor = DeletionEditor::new("  raw  text  ");
        assert_eq!(editor.apply(), "  raw  text  ");
    }

    #[test]
    fn test_multibyte_mask() {
        let text = "café #tag";
        let mut editor = DeletionEditor::new(text);
        editor.mark(6..10);
        assert_eq!(editor.apply(), "café");
    }
}
