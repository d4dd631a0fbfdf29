/// Serialization: `Board` tree in, canonical markdown out.
///
/// Deterministic inverse of the board extractor. Only `title_raw` is ever
/// written for a card; display titles are derived state and never touch
/// the document. A single parse -> serialize cycle is a fixed point: the
/// first cycle may normalize whitespace and token placement, after that the
/// text is stable byte-for-byte.
use crate::ids::inject_block_id;
use crate::types::{
    Board, Item, Lane, FRONTMATTER_KEY, SETTINGS_MARKER_CLOSE, SETTINGS_MARKER_OPEN,
};

/// Serialize a board back into a full markdown document.
pub fn board_to_md(board: &Board) -> String {
    let mut md = String::new();

    match &board.data.frontmatter {
        Some(frontmatter) => {
            md.push_str(frontmatter.trim_end());
            md.push_str("\n\n");
        }
        None => {
            md.push_str("---\n");
            md.push_str(FRONTMATTER_KEY);
            md.push_str(": board\n---\n\n");
        }
    }

    for lane in &board.children {
        push_lane(&mut md, lane);
    }

    if !board.data.archive.is_empty() {
        md.push_str("***\n\n## Archive\n\n");
        for item in &board.data.archive {
            push_item(&mut md, item);
        }
        md.push('\n');
    }

    if let Some(settings) = &board.data.settings {
        if let Ok(json) = serde_json::to_string(settings) {
            md.push_str(SETTINGS_MARKER_OPEN);
            md.push_str("\n```\n");
            md.push_str(&json);
            md.push_str("\n```\n");
            md.push_str(SETTINGS_MARKER_CLOSE);
            md.push('\n');
        }
    } else {
        while md.ends_with("\n\n") {
            md.pop();
        }
    }

    md
}

fn push_lane(md: &mut String, lane: &Lane) {
    md.push_str("## ");
    md.push_str(&lane.data.title);
    if let Some(max_items) = lane.data.max_items {
        md.push_str(&format!(" {}", max_items));
    }
    md.push('\n');

    md.push_str(&format!("<!-- kanban-lane-id: {} -->\n", lane.id));
    if let Some(color) = &lane.data.background_color {
        md.push_str(&format!("<!-- kanban-lane-background: {} -->\n", color));
    }
    md.push('\n');

    if lane.data.should_mark_items_complete {
        md.push_str("**Complete**\n\n");
    }

    for item in &lane.children {
        push_item(md, item);
    }
    md.push('\n');
}

/// One card: `- [c] title` with continuation lines indented so the card
/// stays a single list item, block id reattached on the last line.
fn push_item(md: &mut String, item: &Item) {
    let raw = match &item.data.block_id {
        Some(block_id) => inject_block_id(&item.data.title_raw, block_id),
        None => item.data.title_raw.clone(),
    };

    let mut lines = raw.split('\n');
    let first = lines.next().unwrap_or("");
    let head = format!("- [{}] {}", item.data.check_char, first);
    md.push_str(head.trim_end());
    md.push('\n');
    for line in lines {
        let continuation = format!("  {}", line);
        md.push_str(continuation.trim_end());
        md.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::md_to_board;
    use crate::settings::Settings;
    use crate::types::{BoardData, ItemData, ItemMetadata, LaneData};

    fn item(raw: &str, check_char: char, block_id: Option<&str>) -> Item {
        Item {
            id: block_id.unwrap_or("it1").to_string(),
            data: ItemData {
                title_raw: raw.to_string(),
                title: raw.to_string(),
                title_search: String::new(),
                checked: check_char == 'x',
                check_char,
                block_id: block_id.map(str::to_string),
                metadata: ItemMetadata::default(),
                position: None,
            },
        }
    }

    #[test]
    fn test_lane_layout() {
        let board = Board {
            id: "b.md".into(),
            children: vec![Lane {
                id: "lane1".into(),
                children: vec![
                    item("write docs", ' ', None),
                    item("fix bug\nsee stack trace", 'x', Some("bug7")),
                ],
                data: LaneData {
                    title: "Doing".into(),
                    max_items: Some(3),
                    ..Default::default()
                },
            }],
            data: BoardData::default(),
        };
        let md = board_to_md(&board);
        let expected = "\
---
kanban-plugin: board
---

## Doing 3
<!-- kanban-lane-id: lane1 -->

- [ ] write docs
- [x] fix bug
  see stack trace ^bug7
";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_complete_sentinel_and_background() {
        let board = Board {
            id: "b.md".into(),
            children: vec![Lane {
                id: "lane9".into(),
                children: vec![item("done thing", 'x', None)],
                data: LaneData {
                    title: "Done".into(),
                    should_mark_items_complete: true,
                    background_color: Some("#112233".into()),
                    ..Default::default()
                },
            }],
            data: BoardData::default(),
        };
        let md = board_to_md(&board);
        assert!(md.contains("<!-- kanban-lane-background: #112233 -->"));
        assert!(md.contains("**Complete**\n\n- [x] done thing"));
    }

    #[test]
    fn test_archive_and_settings_block() {
        let mut board = Board {
            id: "b.md".into(),
            children: Vec::new(),
            data: BoardData::default(),
        };
        board.data.archive.push(item("old", 'x', None));
        board.data.settings = Some(serde_json::json!({"kanban-plugin": "board"}));
        let md = board_to_md(&board);
        assert!(md.contains("***\n\n## Archive\n\n- [x] old\n"));
        assert!(md.ends_with("%% kanban:settings\n```\n{\"kanban-plugin\":\"board\"}\n```\n%%\n"));
    }

    #[test]
    fn test_parse_serialize_is_idempotent() {
        let source = "\
---
kanban-plugin: board
---

## To Do
- [ ] ship report @{2024-03-01}
- [/] partial work #tag extra
  with a second line

## Done 2

**Complete**

- [x] released

***

## Archive

- [x] ancient ^old99

%% kanban:settings
```
{\"move-tags\":false}
```
%%
";
        let settings = Settings::default();
        let first = board_to_md(&md_to_board(source, "b.md", &settings));
        let second = board_to_md(&md_to_board(&first, "b.md", &settings));
        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_preserves_raw_titles() {
        let source = "\
---
kanban-plugin: board
---

## Lane
- [ ] *emphasis*, `code`, [link](x.md), and @
- [ ] unparsable date @{tomorrow} stays put
";
        let settings = Settings::default();
        let board = md_to_board(source, "b.md", &settings);
        let lane = &board.children[0];
        assert_eq!(
            lane.children[0].data.title_raw,
            "*emphasis*, `code`, [link](x.md), and @"
        );
        assert_eq!(
            lane.children[1].data.title_raw,
            "unparsable date @{tomorrow} stays put"
        );
        let md = board_to_md(&board);
        assert!(md.contains("- [ ] *emphasis*, `code`, [link](x.md), and @\n"));
        assert!(md.contains("- [ ] unparsable date @{tomorrow} stays put\n"));
    }
}
