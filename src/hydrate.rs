/// Item hydration: one list-item source fragment in, one `ItemData` out.
///
/// The fragment is the verbatim slice of the document covered by the list
/// item's position (or a synthesized `- [c] ...` line for edits). The
/// hydrator de-indents it, peels the checkbox marker and trailing block id,
/// then runs the token extractors in fixed precedence order over the
/// deferred-deletion editor. Extraction always populates the metadata; the
/// move settings only decide whether the matched text is stripped from the
/// display title. `title_raw` stays verbatim no matter what.
use std::sync::LazyLock;

use chrono::NaiveDate;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::KanbanError;
use crate::extract::{date, fields, members, priority, tags};
use crate::ids;
use crate::settings::Settings;
use crate::textedit::DeletionEditor;
use crate::types::{InlineField, ItemData, ItemMetadata, Position};

static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^( *)([-*+]|\d{1,9}[.)])( +|$)").expect("valid marker regex"));

static CHECKBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.)\]").expect("valid checkbox regex"));

/// Hydrate one list-item fragment.
///
/// `force_complete` is set for items in a lane carrying the `**Complete**`
/// sentinel; they are checked at creation time regardless of their marker.
pub fn hydrate_item_text(
    fragment: &str,
    settings: &Settings,
    force_complete: bool,
    position: Option<Position>,
) -> Result<ItemData, KanbanError> {
    let fragment = fragment.trim_end_matches('\n');
    let mut lines = fragment.split('\n');
    let first_line = lines.next().unwrap_or("");

    let marker = LIST_MARKER_RE
        .captures(first_line)
        .ok_or_else(|| KanbanError::NotAListItem(first_line.to_string()))?;
    let content_indent = marker.get(0).expect("capture 0").end();

    let mut content = String::from(&first_line[content_indent..]);
    for line in lines {
        content.push('\n');
        content.push_str(deindent(line, content_indent));
    }
    let content = content.trim_end();

    // Checkbox marker. `[x] rest` | `[x]` alone (empty card) | none at all.
    let mut check_char = ' ';
    let mut body = content;
    if let Some(caps) = CHECKBOX_RE.captures(content) {
        let end = caps.get(0).expect("capture 0").end();
        let rest = &content[end..];
        if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\n') {
            check_char = caps[1].chars().next().expect("single char capture");
            body = rest.strip_prefix(' ').unwrap_or(rest);
        }
    }

    let block_id = ids::extract_block_id(body);
    let title_raw = if block_id.is_some() {
        ids::strip_block_id(body)
    } else {
        body.to_string()
    };

    let mut checked = check_char.eq_ignore_ascii_case(&settings.done_character);
    if force_complete {
        checked = true;
        check_char = settings.done_character;
    }

    let (title, metadata) = extract_metadata(&title_raw, settings, block_id.clone());

    Ok(ItemData {
        title_search: search_text(&title_raw),
        title,
        title_raw,
        checked,
        check_char,
        block_id,
        metadata,
        position,
    })
}

/// Run the extractors in precedence order over one deletion editor. Returns
/// the display title and the populated metadata.
fn extract_metadata(
    title_raw: &str,
    settings: &Settings,
    block_id: Option<String>,
) -> (String, ItemMetadata) {
    let mut metadata = ItemMetadata {
        block_id,
        ..Default::default()
    };
    let mut editor = DeletionEditor::new(title_raw);

    // 1. Date, with an adjacent time folded in.
    if let Some(found) = date::extract_date(editor.working(), settings) {
        metadata.date = Some(found.date);
        metadata.date_str = Some(found.date_str);
        metadata.time = found.time;
        metadata.time_str = found.time_str;
        consume(&mut editor, found.span, settings.move_dates);
    }

    // 2. Standalone time, unless already captured with the date.
    if metadata.time.is_none() {
        if let Some(found) = date::extract_time(editor.working(), settings) {
            metadata.time = Some(found.time);
            metadata.time_str = Some(found.time_str);
            consume(&mut editor, found.span, settings.move_dates);
        }
    }

    // 3. Priority: first marker wins, duplicates stay as plain text.
    if let Some((priority, span)) = priority::extract_priority(editor.working()) {
        metadata.priority = Some(priority);
        consume(&mut editor, span, settings.move_task_metadata);
    }

    // 4. Tags. Duplicates are always removed; the surviving first
    //    occurrence honors the move setting. Trailing punctuation noise is
    //    removed either way.
    let tag_matches = tags::extract_tags(editor.working());
    metadata.tags = tag_matches.tags;
    for span in tag_matches.dup_spans {
        editor.mark(span);
    }
    for kept in tag_matches.keeps {
        if settings.move_tags {
            editor.mark(kept.tag.start..kept.trailing_noise.end);
        } else {
            editor.mask(kept.tag);
            editor.mark(kept.trailing_noise);
        }
    }

    // 5. Assigned members.
    let (found_members, member_spans) = members::extract_members(editor.working());
    metadata.assigned_members = found_members;
    for span in member_spans {
        consume(&mut editor, span, settings.move_task_metadata);
    }

    // 6. Inline key::value fields. Spans come from the masked working view
    //    (so a value never swallows an earlier-extracted token), but the
    //    stored value is re-read from the original text so masking leaves
    //    no artifacts in the metadata.
    let date_format = settings.chrono_date_format();
    for field in fields::extract_fields(editor.working()) {
        let value = normalize_field_value(&editor.restore(field.value_span.clone()));
        if field.task_field && field.key.eq_ignore_ascii_case("start") {
            if let Ok(start) = NaiveDate::parse_from_str(&value, &date_format) {
                metadata.start_date = Some(start);
                metadata.start_date_str = Some(value.clone());
            }
        }
        let moved = if field.task_field {
            settings.move_task_metadata
        } else {
            !settings.keeps_inline_metadata_in_body()
        };
        consume(&mut editor, field.span.clone(), moved);
        metadata.inline_metadata.push(InlineField {
            key: field.key,
            value,
            task_field: field.task_field,
        });
    }

    (editor.apply(), metadata)
}

fn consume(editor: &mut DeletionEditor, span: std::ops::Range<usize>, moved: bool) {
    if moved {
        editor.mark(span);
    } else {
        editor.mask(span);
    }
}

/// Restored field values may carry a doubled space where a moved token was
/// cut out of the middle; collapse runs so the stored value reads clean.
fn normalize_field_value(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn deindent(line: &str, width: usize) -> &str {
    let leading = line.len() - line.trim_start_matches(' ').len();
    &line[leading.min(width)..]
}

/// Search-oriented flattening of the card's inline content: visible text,
/// hashtags, code spans, and link/image targets, folded for matching. Does
/// not go through the deletion editor; it is independent of the display
/// title.
fn search_text(title_raw: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    for event in Parser::new(title_raw) {
        match event {
            Event::Text(text) => parts.push(text.to_string()),
            Event::Code(code) => parts.push(code.to_string()),
            Event::Start(Tag::Link { dest_url, .. }) | Event::Start(Tag::Image { dest_url, .. }) => {
                parts.push(dest_url.to_string());
            }
            _ => {}
        }
    }
    normalize_for_search(&parts.join(" "))
}

/// Unicode-aware fold: lowercases, NFD-decomposes, strips combining marks,
/// and collapses whitespace. This lets "résumé" match "resume".
fn normalize_for_search(value: &str) -> String {
    let folded: String = value
        .to_lowercase()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
