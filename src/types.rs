use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Frontmatter key marking a document as a board. A document without it is
/// not parsed as a board at all (empty children, no error).
pub const FRONTMATTER_KEY: &str = "kanban-plugin";

/// Markers demarcating the persisted-settings code block at the end of a
/// board document.
pub const SETTINGS_MARKER_OPEN: &str = "%% kanban:settings";
pub const SETTINGS_MARKER_CLOSE: &str = "%%";

/// Heading text that opens the archive section (when immediately preceded
/// by a thematic break).
pub const ARCHIVE_HEADING: &str = "Archive";

/// Sentinel paragraph under a lane heading marking the lane as "complete":
/// every item hydrated into it is checked at creation time.
pub const COMPLETE_SENTINEL: &str = "**Complete**";

/// A point in the source document. `line` and `column` are 1-based,
/// `offset` is a 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Source span of a node, taken verbatim from the document tree. Used to
/// re-slice the document for incremental edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One `key::value` field embedded in card text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineField {
    pub key: String,
    pub value: String,
    /// Reserved task-field keys (`start`, `due`, ...) found on the first
    /// line; their move-eligibility is governed by `move-task-metadata`
    /// rather than `inline-metadata-position`.
    pub task_field: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_str: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_str: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_members: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_metadata: Vec<InlineField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    /// Verbatim source text of the card (checkbox marker and trailing
    /// block id stripped, continuation lines de-indented). The only
    /// representation serialized back to disk; never derived from `title`.
    pub title_raw: String,
    /// `title_raw` with the extracted tokens removed per the move settings.
    /// Display only.
    pub title: String,
    /// Search-oriented flattening of the card's inline content.
    pub title_search: String,
    pub checked: bool,
    pub check_char: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    pub metadata: ItemMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// One card. Always a leaf; cards never nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub data: ItemData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneData {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub should_mark_items_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Runtime-only sort key set by the host; never serialized to markdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: String,
    pub children: Vec<Item>,
    pub data: LaneData,
}

/// A parse failure recorded on the board. A non-empty error list makes the
/// board provisionally read-only: saving is suppressed until a successful
/// reparse clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub description: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardData {
    /// Raw settings-block JSON, kept as parsed so unknown keys round-trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    /// Raw frontmatter text, fences included, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archive: Vec<Item>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorReport>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_searching: bool,
}

/// One board per document; `id` is the document path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub children: Vec<Lane>,
    pub data: BoardData,
}

impl Board {
    /// A board with parse errors must not be written back to disk.
    pub fn can_save(&self) -> bool {
        self.data.errors.is_empty()
    }

    /// Total number of cards, archive included.
    pub fn item_count(&self) -> usize {
        self.children.iter().map(|lane| lane.children.len()).sum::<usize>()
            + self.data.archive.len()
    }
}
