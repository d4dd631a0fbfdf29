/// Board extraction: markdown document in, `Board` tree out.
///
/// Document layout:
///   --- YAML frontmatter, must contain the `kanban-plugin` key ---
///   ## Lane Title
///   <!-- kanban-lane-id: ... -->
///   - [ ] card text
///   ***
///   ## Archive
///   - [x] archived card
///   %% kanban:settings ... %%
///
/// Structural failures are caught here and recorded into
/// `Board.data.errors`, yielding a board with empty children instead of
/// aborting; a document without the frontmatter key is simply not a board
/// (empty children, no error).
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{self, DocNode, LineIndex};
use crate::error::KanbanError;
use crate::hydrate::hydrate_item_text;
use crate::ids::generate_id;
use crate::settings::Settings;
use crate::types::{
    Board, BoardData, ErrorReport, Item, Lane, LaneData, ARCHIVE_HEADING, COMPLETE_SENTINEL,
    FRONTMATTER_KEY, SETTINGS_MARKER_CLOSE, SETTINGS_MARKER_OPEN,
};

static LANE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*kanban-lane-id:\s*([^\s>]+)\s*-->").expect("valid lane id regex")
});

static LANE_BG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*kanban-lane-background:\s*([^>]+?)\s*-->")
        .expect("valid lane background regex")
});

static MAX_ITEMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\S)\s+(\d+)$").expect("valid max items regex"));

/// Parse a markdown document into a board. `path` becomes the board id.
pub fn md_to_board(content: &str, path: &str, global_settings: &Settings) -> Board {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut board = Board {
        id: path.to_string(),
        children: Vec::new(),
        data: BoardData::default(),
    };

    let (frontmatter, body_start) = split_frontmatter(&content);
    let Some(frontmatter) = frontmatter else {
        return board;
    };

    match is_board_frontmatter(frontmatter) {
        Ok(false) => return board,
        Ok(true) => {}
        Err(error) => {
            record_error(&mut board, &error);
            return board;
        }
    }
    board.data.frontmatter = Some(frontmatter.to_string());

    let body = &content[body_start..];
    let (body_len, settings_value) = match peel_settings_block(body) {
        Ok(peeled) => peeled,
        Err(error) => {
            record_error(&mut board, &error);
            return board;
        }
    };

    let settings = match &settings_value {
        Some(value) => match global_settings.merged_with(value) {
            Ok(merged) => merged,
            Err(error) => {
                record_error(&mut board, &error);
                return board;
            }
        },
        None => global_settings.clone(),
    };
    board.data.settings = settings_value;

    let index = LineIndex::new(&content);
    let nodes = ast::parse_document(&body[..body_len], body_start, &index);

    match collect_lanes(&content, &nodes, &settings) {
        Ok((lanes, archive)) => {
            board.children = lanes;
            board.data.archive = archive;
        }
        Err(error) => record_error(&mut board, &error),
    }

    board
}

fn record_error(board: &mut Board, error: &KanbanError) {
    log::error!("[kanban.board] parse failed for {}: {}", board.id, error);
    board.children = Vec::new();
    board.data.archive = Vec::new();
    board.data.errors.push(ErrorReport {
        description: "Failed to parse board".to_string(),
        details: error.to_string(),
    });
}

/// Split the YAML frontmatter off the document. Returns the raw frontmatter
/// (fences included) and the byte offset where the body starts.
fn split_frontmatter(content: &str) -> (Option<&str>, usize) {
    if !content.starts_with("---\n") {
        return (None, 0);
    }
    let mut offset = 4;
    for line in content[4..].split_inclusive('\n') {
        let end = offset + line.len();
        if line.trim_end() == "---" {
            return (Some(&content[..end]), end);
        }
        offset = end;
    }
    (None, 0)
}

/// A document belongs to this format iff its frontmatter carries the
/// `kanban-plugin` key. Invalid YAML is a structural failure.
fn is_board_frontmatter(frontmatter: &str) -> Result<bool, KanbanError> {
    let inner = frontmatter
        .trim_start_matches("---")
        .trim_end()
        .trim_end_matches("---");
    let parsed: serde_yaml::Value = serde_yaml::from_str(inner)?;
    Ok(parsed.get(FRONTMATTER_KEY).is_some())
}

/// Peel the trailing `%% kanban:settings` block off the body. Returns the
/// body length without the block plus the parsed JSON object, if any.
fn peel_settings_block(body: &str) -> Result<(usize, Option<serde_json::Value>), KanbanError> {
    if !body.trim_end().ends_with(SETTINGS_MARKER_CLOSE) {
        return Ok((body.len(), None));
    }
    let Some(open_index) = body.rfind(SETTINGS_MARKER_OPEN) else {
        return Ok((body.len(), None));
    };
    if open_index > 0 && body.as_bytes()[open_index - 1] != b'\n' {
        return Ok((body.len(), None));
    }

    let json_text: String = body[open_index..]
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed != SETTINGS_MARKER_OPEN
                && trimmed != SETTINGS_MARKER_CLOSE
                && !trimmed.starts_with("```")
        })
        .collect::<Vec<_>>()
        .join("\n");
    if json_text.trim().is_empty() {
        return Ok((open_index, None));
    }
    let value = serde_json::from_str(json_text.trim())?;
    Ok((open_index, Some(value)))
}

/// Group top-level nodes into lanes and the archive section.
fn collect_lanes(
    content: &str,
    nodes: &[DocNode],
    settings: &Settings,
) -> Result<(Vec<Lane>, Vec<Item>), KanbanError> {
    let mut lanes: Vec<Lane> = Vec::new();
    let mut archive: Vec<Item> = Vec::new();
    let mut current: Option<Lane> = None;
    let mut persisted_id_claimed = false;
    let mut in_archive = false;
    let mut after_rule = false;

    for node in nodes {
        let was_after_rule = std::mem::replace(&mut after_rule, false);
        match node {
            DocNode::Heading(heading) => {
                if let Some(lane) = current.take() {
                    lanes.push(lane);
                }
                if was_after_rule && heading.text.trim() == ARCHIVE_HEADING {
                    in_archive = true;
                    continue;
                }
                if in_archive {
                    // Everything after the archive heading stays archived.
                    continue;
                }
                let (title, max_items) = split_max_items(&heading.text);
                persisted_id_claimed = false;
                current = Some(Lane {
                    id: generate_id(),
                    children: Vec::new(),
                    data: LaneData {
                        title,
                        max_items,
                        ..Default::default()
                    },
                });
            }
            DocNode::Html(html) => {
                if let Some(lane) = current.as_mut() {
                    if lane.children.is_empty() {
                        if !persisted_id_claimed {
                            if let Some(caps) = LANE_ID_RE.captures(&html.text) {
                                lane.id = caps[1].to_string();
                                persisted_id_claimed = true;
                            }
                        }
                        if lane.data.background_color.is_none() {
                            if let Some(caps) = LANE_BG_RE.captures(&html.text) {
                                lane.data.background_color = Some(caps[1].to_string());
                            }
                        }
                    }
                }
            }
            DocNode::Paragraph(paragraph) => {
                if let Some(lane) = current.as_mut() {
                    if lane.children.is_empty() && paragraph.text == COMPLETE_SENTINEL {
                        lane.data.should_mark_items_complete = true;
                    }
                }
            }
            DocNode::List(list) => {
                let force_complete = !in_archive
                    && current
                        .as_ref()
                        .map(|lane| lane.data.should_mark_items_complete)
                        .unwrap_or(false);
                for item_node in &list.items {
                    let position = item_node.position;
                    let start = position.start.offset;
                    let end = position.end.offset;
                    if end > content.len() || start > end {
                        return Err(KanbanError::SpanOutOfBounds {
                            start,
                            end,
                            len: content.len(),
                        });
                    }
                    let fragment = &content[start..end];
                    let data =
                        hydrate_item_text(fragment, settings, force_complete, Some(position))?;
                    let item = Item {
                        id: data
                            .block_id
                            .clone()
                            .unwrap_or_else(generate_id),
                        data,
                    };
                    if in_archive {
                        archive.push(item);
                    } else if let Some(lane) = current.as_mut() {
                        lane.children.push(item);
                    }
                    // A list with no lane above it is not part of the board.
                }
            }
            DocNode::Rule(_) => {
                after_rule = true;
            }
        }
    }

    if let Some(lane) = current.take() {
        lanes.push(lane);
    }

    Ok((lanes, archive))
}

/// A heading may carry a trailing item limit: `## Doing 3`.
fn split_max_items(title: &str) -> (String, Option<usize>) {
    if let Some(caps) = MAX_ITEMS_RE.captures(title.trim()) {
        if let Ok(max_items) = caps[2].parse::<usize>() {
            return (caps[1].to_string(), Some(max_items));
        }
    }
    (title.trim().to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_BOARD: &str = "\
---
kanban-plugin: board
---

## To Do
<!-- kanban-lane-id: lane1 -->

- [ ] ship report @{2024-03-01}
- [ ] buy milk #errand ^blk01

## Done 5
<!-- kanban-lane-id: lane2 -->
<!-- kanban-lane-background: #223344 -->

**Complete**

- [x] released v2

***

## Archive

- [x] old card

%% kanban:settings
```
{\"kanban-plugin\":\"board\",\"move-tags\":true}
```
%%
";

    #[test]
    fn test_parse_sample_board() {
        let board = md_to_board(SAMPLE_BOARD, "notes/todo.md", &Settings::default());
        assert!(board.data.errors.is_empty());
        assert_eq!(board.id, "notes/todo.md");
        assert_eq!(board.children.len(), 2);

        let todo = &board.children[0];
        assert_eq!(todo.id, "lane1");
        assert_eq!(todo.data.title, "To Do");
        assert_eq!(todo.children.len(), 2);
        assert_eq!(
            todo.children[0].data.metadata.date_str.as_deref(),
            Some("2024-03-01")
        );
        assert_eq!(todo.children[0].data.title, "ship report");
        // Board-local settings enabled move-tags.
        assert_eq!(todo.children[1].data.title, "buy milk");
        assert_eq!(todo.children[1].id, "blk01");

        let done = &board.children[1];
        assert_eq!(done.data.title, "Done");
        assert_eq!(done.data.max_items, Some(5));
        assert_eq!(done.data.background_color.as_deref(), Some("#223344"));
        assert!(done.data.should_mark_items_complete);
        assert!(done.children[0].data.checked);
    }

    #[test]
    fn test_archive_grouping() {
        let board = md_to_board(SAMPLE_BOARD, "b.md", &Settings::default());
        assert_eq!(board.data.archive.len(), 1);
        assert_eq!(board.data.archive[0].data.title_raw, "old card");
        // The archive heading does not become a lane.
        assert!(board
            .children
            .iter()
            .all(|lane| lane.data.title != "Archive"));
    }

    #[test]
    fn test_archive_requires_preceding_rule() {
        let md = "---\nkanban-plugin: board\n---\n\n## Archive\n\n- [ ] still a lane\n";
        let board = md_to_board(md, "b.md", &Settings::default());
        assert_eq!(board.children.len(), 1);
        assert_eq!(board.children[0].data.title, "Archive");
        assert!(board.data.archive.is_empty());
    }

    #[test]
    fn test_not_a_board_is_not_an_error() {
        let md = "---\ntitle: plain note\n---\n\n## Heading\n- [ ] task\n";
        let board = md_to_board(md, "note.md", &Settings::default());
        assert!(board.children.is_empty());
        assert!(board.data.errors.is_empty());
    }

    #[test]
    fn test_no_frontmatter_is_not_a_board() {
        let board = md_to_board("## Lane\n- [ ] task\n", "note.md", &Settings::default());
        assert!(board.children.is_empty());
        assert!(board.data.errors.is_empty());
    }

    #[test]
    fn test_malformed_settings_block_is_an_error() {
        let md = "---\nkanban-plugin: board\n---\n\n## Lane\n\n- [ ] a\n\n%% kanban:settings\n```\n{not json\n```\n%%\n";
        let board = md_to_board(md, "b.md", &Settings::default());
        assert!(!board.can_save());
        assert!(board.children.is_empty());
        assert_eq!(board.data.errors.len(), 1);
    }

    #[test]
    fn test_invalid_frontmatter_is_an_error() {
        let md = "---\nkanban-plugin: [unclosed\n---\n\n## Lane\n";
        let board = md_to_board(md, "b.md", &Settings::default());
        assert!(!board.data.errors.is_empty());
        assert!(board.children.is_empty());
    }

    #[test]
    fn test_empty_lane_and_lane_without_marker() {
        let md = "---\nkanban-plugin: board\n---\n\n## Backlog\n\n## Later\n\n- [ ] someday\n";
        let board = md_to_board(md, "b.md", &Settings::default());
        assert_eq!(board.children.len(), 2);
        assert!(board.children[0].children.is_empty());
        // No persisted marker: a fresh id is generated each parse.
        assert_eq!(board.children[0].id.len(), 8);
        assert_eq!(board.children[1].children.len(), 1);
    }

    #[test]
    fn test_complete_lane_checks_items() {
        let md = "---\nkanban-plugin: board\n---\n\n## Done\n\n**Complete**\n\n- [ ] finished anyway\n";
        let board = md_to_board(md, "b.md", &Settings::default());
        let lane = &board.children[0];
        assert!(lane.data.should_mark_items_complete);
        assert!(lane.children[0].data.checked);
        assert_eq!(lane.children[0].data.check_char, 'x');
    }

    #[test]
    fn test_item_positions_reslice_source() {
        let board = md_to_board(SAMPLE_BOARD, "b.md", &Settings::default());
        let item = &board.children[0].children[0];
        let position = item.data.position.expect("parsed items carry positions");
        let slice = &SAMPLE_BOARD[position.start.offset..position.end.offset];
        assert!(slice.trim_end().ends_with("@{2024-03-01}"));
        assert!(slice.starts_with("- [ ]"));
    }
}
