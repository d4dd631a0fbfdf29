/// Error taxonomy for the markdown <-> board converter.
///
/// Structural failures (frontmatter, settings block, malformed fragments)
/// are surfaced as `KanbanError`; board-level entry points catch them into
/// `Board.data.errors` instead of propagating. Token extraction failures are
/// never errors; an unparsable token is left in place as ordinary text.

#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("Invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    #[error("Invalid settings block: {0}")]
    SettingsBlock(#[from] serde_json::Error),

    #[error("Fragment is not a list item: {0:?}")]
    NotAListItem(String),

    #[error("Item span {start}..{end} out of bounds (document length {len})")]
    SpanOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
}
