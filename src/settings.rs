/// Board settings snapshot.
///
/// Extraction behavior is driven entirely by a `Settings` value passed
/// explicitly into every extractor and hydrator; there is no ambient or
/// global settings state. Board-local overrides come from the trailing
/// `%% kanban:settings` fenced JSON block and are merged key-wise over the
/// caller's snapshot; absence of the block means the snapshot is used as-is.
use serde::{Deserialize, Serialize};

use crate::error::KanbanError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Character(s) introducing a date token (`@{2024-03-01}`).
    pub date_trigger: String,
    /// Character(s) introducing a time token (`@@{14:30}`).
    pub time_trigger: String,
    /// Date format in the document's notation (`YYYY-MM-DD`).
    pub date_format: String,
    /// Time format in the document's notation (`HH:mm`).
    pub time_format: String,
    /// Format of the timestamp prepended to archived cards.
    pub archive_date_format: String,
    /// Separator between the archive timestamp and the card title.
    pub archive_date_separator: String,
    /// Whether archiving a card prepends the archive timestamp.
    pub append_archive_date: bool,
    /// Strip extracted date/time tokens from the display title.
    pub move_dates: bool,
    /// Strip extracted tags from the display title.
    pub move_tags: bool,
    /// Strip priority, assigned members, and reserved task fields from the
    /// display title.
    pub move_task_metadata: bool,
    /// Where general `key::value` fields live: `"body"` keeps them in the
    /// display title, anything else strips them.
    pub inline_metadata_position: String,
    /// Checkbox character meaning "done". Any other non-space character is
    /// an alternate in-progress state, not checked.
    pub done_character: char,
    /// Persisted for the host UI; no effect on parsing.
    pub new_line_trigger: String,
    /// Persisted for the host UI; no effect on parsing.
    pub show_checkboxes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_trigger: "@".to_string(),
            time_trigger: "@@".to_string(),
            date_format: "YYYY-MM-DD".to_string(),
            time_format: "HH:mm".to_string(),
            archive_date_format: "YYYY-MM-DD HH:mm".to_string(),
            archive_date_separator: " ".to_string(),
            append_archive_date: false,
            move_dates: true,
            move_tags: false,
            move_task_metadata: true,
            inline_metadata_position: "body".to_string(),
            done_character: 'x',
            new_line_trigger: "shift-enter".to_string(),
            show_checkboxes: true,
        }
    }
}

impl Settings {
    /// Merge board-local overrides (the parsed settings-block JSON object)
    /// over this snapshot. Only keys present in the object take effect;
    /// unknown keys are ignored.
    pub fn merged_with(&self, overrides: &serde_json::Value) -> Result<Settings, KanbanError> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base_map), Some(patch)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in patch {
                base_map.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Whether general inline fields stay in the display title.
    pub fn keeps_inline_metadata_in_body(&self) -> bool {
        self.inline_metadata_position == "body"
    }

    /// The configured date format as a chrono format string.
    pub fn chrono_date_format(&self) -> String {
        to_chrono_format(&self.date_format)
    }

    /// The configured time format as a chrono format string.
    pub fn chrono_time_format(&self) -> String {
        to_chrono_format(&self.time_format)
    }

    /// The configured archive timestamp format as a chrono format string.
    pub fn chrono_archive_date_format(&self) -> String {
        to_chrono_format(&self.archive_date_format)
    }
}

/// Format tokens in the document notation, longest first so the scanner can
/// match greedily.
const FORMAT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%m"),
    ("DD", "%d"),
    ("D", "%d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%H"),
    ("hh", "%I"),
    ("h", "%I"),
    ("mm", "%M"),
    ("m", "%M"),
    ("ss", "%S"),
    ("s", "%S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// Translate a moment.js-style format string (`YYYY-MM-DD`) into chrono
/// specifiers (`%Y-%m-%d`). Unrecognized characters pass through as
/// literals; `%` is escaped.
pub fn to_chrono_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (token, spec) in FORMAT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }
        let ch = rest.chars().next().unwrap();
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}
