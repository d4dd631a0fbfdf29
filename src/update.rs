/// Edit and reparse orchestration.
///
/// Single-card edits never reparse the document: the new raw text is
/// synthesized back into a one-item markdown fragment and hydrated alone,
/// replacing just that item in the tree. A full reparse re-runs the same
/// path over every existing item's `title_raw`, which re-derives metadata
/// under the current settings without discarding the board structure.
/// Nothing is mutated in place; every operation returns a new value.
use crate::error::KanbanError;
use crate::hydrate::hydrate_item_text;
use crate::ids::{generate_id, inject_block_id};
use crate::settings::Settings;
use crate::types::{Board, Item};

/// Re-hydrate one item from new raw text, keeping its id, check state, and
/// block id. On failure the error is logged and returned; the caller keeps
/// the previous item (the edit is a no-op).
pub fn update_item_content(
    item: &Item,
    new_raw: &str,
    settings: &Settings,
) -> Result<Item, KanbanError> {
    let fragment = synthesize_fragment(new_raw, item.data.check_char, item.data.block_id.as_deref());
    let mut data = match hydrate_item_text(&fragment, settings, false, item.data.position) {
        Ok(data) => data,
        Err(error) => {
            log::error!("[kanban.update] failed to hydrate edited item: {}", error);
            return Err(error);
        }
    };
    data.checked = item.data.checked;
    data.check_char = item.data.check_char;
    Ok(Item {
        id: item.id.clone(),
        data,
    })
}

/// Re-hydrate every item (lanes and archive) from its `title_raw` under the
/// current settings. Used when settings that affect extraction change.
/// Lane and item identity is preserved; an item that fails to re-hydrate is
/// kept as-is.
pub fn reparse_board(board: &Board, settings: &Settings) -> Board {
    let mut reparsed = board.clone();
    for lane in &mut reparsed.children {
        for item in &mut lane.children {
            if let Ok(updated) = update_item_content(item, &item.data.title_raw.clone(), settings)
            {
                *item = updated;
            }
        }
    }
    for item in &mut reparsed.data.archive {
        if let Ok(updated) = update_item_content(item, &item.data.title_raw.clone(), settings) {
            *item = updated;
        }
    }
    reparsed
}

/// Optional auto-tags appended to newly created cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewItemOptions<'a> {
    /// Append the destination lane's name as a tag.
    pub lane_name: Option<&'a str>,
    /// Append the document's name as a tag.
    pub board_name: Option<&'a str>,
}

/// Hydrate free text into a brand-new item with a fresh id.
pub fn new_item(
    text: &str,
    settings: &Settings,
    options: NewItemOptions<'_>,
) -> Result<Item, KanbanError> {
    let mut text = text.trim().to_string();
    for name in [options.lane_name, options.board_name].into_iter().flatten() {
        if let Some(tag) = tag_from_name(name) {
            if !contains_tag(&text, &tag) {
                append_to_first_line(&mut text, &tag);
            }
        }
    }

    let fragment = synthesize_fragment(&text, ' ', None);
    let data = hydrate_item_text(&fragment, settings, false, None)?;
    Ok(Item {
        id: generate_id(),
        data,
    })
}

/// Prepare an item for the archive section: when `append-archive-date` is
/// on, the archive timestamp is prepended to the raw text and the item is
/// re-hydrated so its derived fields stay consistent.
pub fn archive_item(item: &Item, settings: &Settings) -> Result<Item, KanbanError> {
    if !settings.append_archive_date {
        return Ok(item.clone());
    }
    let stamp = chrono::Local::now()
        .format(&settings.chrono_archive_date_format())
        .to_string();
    let new_raw = format!(
        "{}{}{}",
        stamp, settings.archive_date_separator, item.data.title_raw
    );
    update_item_content(item, &new_raw, settings)
}

/// Rebuild the one-line markdown fragment for a card so it can be hydrated
/// in isolation: checkbox marker up front, continuation lines indented,
/// block id reattached.
fn synthesize_fragment(text: &str, check_char: char, block_id: Option<&str>) -> String {
    let text = match block_id {
        Some(id) => inject_block_id(text, id),
        None => text.to_string(),
    };
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or("");
    let mut fragment = format!("- [{}] {}", check_char, first);
    for line in lines {
        fragment.push_str("\n  ");
        fragment.push_str(line);
    }
    fragment
}

fn tag_from_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '/'))
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("#{}", cleaned))
}

fn contains_tag(text: &str, tag: &str) -> bool {
    crate::extract::tags::extract_tags(text)
        .tags
        .iter()
        .any(|existing| existing.eq_ignore_ascii_case(tag))
}

fn append_to_first_line(text: &mut String, suffix: &str) {
    match text.find('\n') {
        Some(newline) => text.insert_str(newline, &format!(" {}", suffix)),
        None => {
            text.push(' ');
            text.push_str(suffix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::md_to_board;

    fn board_fixture() -> Board {
        let md = "\
---
kanban-plugin: board
---

## To Do
- [ ] old text #keep ^it01
- [x] untouched neighbor
";
        md_to_board(md, "b.md", &Settings::default())
    }

    #[test]
    fn test_update_item_content_replaces_one_item() {
        let settings = Settings::default();
        let board = board_fixture();
        let item = &board.children[0].children[0];
        let updated = update_item_content(item, "new text @{2024-06-01}", &settings).unwrap();

        assert_eq!(updated.id, item.id);
        assert_eq!(updated.data.block_id.as_deref(), Some("it01"));
        assert_eq!(updated.data.title_raw, "new text @{2024-06-01}");
        assert_eq!(updated.data.title, "new text");
        assert_eq!(
            updated.data.metadata.date_str.as_deref(),
            Some("2024-06-01")
        );
        // Check state survives the edit.
        assert!(!updated.data.checked);
    }

    #[test]
    fn test_reparse_rederives_metadata_under_new_settings() {
        let md = "\
---
kanban-plugin: board
---

## Lane
- [ ] pay rent !{2024-04-01}
";
        let old = Settings::default();
        let board = md_to_board(md, "b.md", &old);
        let item = &board.children[0].children[0];
        // "@" trigger does not match "!{...}".
        assert!(item.data.metadata.date.is_none());

        let new = Settings {
            date_trigger: "!".into(),
            ..Default::default()
        };
        let reparsed = reparse_board(&board, &new);
        let item = &reparsed.children[0].children[0];
        assert_eq!(item.data.metadata.date_str.as_deref(), Some("2024-04-01"));
        assert_eq!(item.data.title, "pay rent");
        // Structure and identity are untouched.
        assert_eq!(reparsed.children[0].id, board.children[0].id);
        assert_eq!(item.data.title_raw, "pay rent !{2024-04-01}");
    }

    #[test]
    fn test_new_item_appends_tags() {
        let settings = Settings::default();
        let item = new_item(
            "water the plants",
            &settings,
            NewItemOptions {
                lane_name: Some("This Week"),
                board_name: Some("home"),
            },
        )
        .unwrap();
        assert_eq!(item.data.title_raw, "water the plants #This-Week #home");
        assert_eq!(item.data.metadata.tags, vec!["#This-Week", "#home"]);
        assert_eq!(item.id.len(), 8);
    }

    #[test]
    fn test_new_item_skips_existing_tag() {
        let settings = Settings::default();
        let item = new_item(
            "prune #home already",
            &settings,
            NewItemOptions {
                lane_name: None,
                board_name: Some("Home"),
            },
        )
        .unwrap();
        assert_eq!(item.data.title_raw, "prune #home already");
    }

    #[test]
    fn test_archive_item_prepends_date() {
        let settings = Settings {
            append_archive_date: true,
            archive_date_format: "YYYY".into(),
            ..Default::default()
        };
        let board = board_fixture();
        let archived = archive_item(&board.children[0].children[1], &settings).unwrap();
        let year = chrono::Local::now().format("%Y").to_string();
        assert_eq!(
            archived.data.title_raw,
            format!("{} untouched neighbor", year)
        );
    }

    #[test]
    fn test_archive_item_without_setting_is_identity() {
        let settings = Settings::default();
        let board = board_fixture();
        let item = &board.children[0].children[1];
        let archived = archive_item(item, &settings).unwrap();
        assert_eq!(&archived, item);
    }
}
