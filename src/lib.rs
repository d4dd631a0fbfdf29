//! Lossless bidirectional conversion between kanban markdown documents and
//! a `Board` tree. Parsing never normalizes the text it cannot represent:
//! card titles are kept verbatim, frontmatter and the persisted settings
//! block round-trip byte-for-byte, and a parse -> serialize cycle reaches a
//! fixed point after at most one normalizing pass.

pub mod ast;
pub mod board;
pub mod error;
pub mod extract;
pub mod hydrate;
pub mod ids;
pub mod serialize;
pub mod settings;
pub mod textedit;
pub mod types;
pub mod update;

pub use board::md_to_board;
pub use error::KanbanError;
pub use serialize::board_to_md;
pub use settings::Settings;
pub use types::{Board, BoardData, ErrorReport, Item, ItemData, ItemMetadata, Lane, LaneData};
pub use update::{archive_item, new_item, reparse_board, update_item_content, NewItemOptions};
