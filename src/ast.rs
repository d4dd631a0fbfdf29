/// Positioned document node tree.
///
/// The generic CommonMark tokenizer is an external collaborator
/// (pulldown-cmark); this module is the only place that touches its event
/// stream. It adapts offset-iterated events into a flat list of top-level
/// `DocNode`s carrying `{line, column, offset}` positions, which is what the
/// board extractor consumes. Block content is never reconstructed from
/// inline events; consumers re-slice the original source by position, so
/// arbitrary user-authored markdown survives byte-for-byte.
use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::types::{Point, Position};

/// Byte-offset to line/column mapping for one document.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// 1-based line/column for a byte offset. Column is a byte column.
    pub fn point(&self, offset: usize) -> Point {
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        Point {
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
            offset,
        }
    }

    pub fn position(&self, span: &Range<usize>) -> Position {
        Position {
            start: self.point(span.start),
            end: self.point(span.end),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadingNode {
    pub level: u8,
    /// Heading text with the ATX markers stripped, otherwise verbatim.
    pub text: String,
    pub position: Position,
}

/// One list item, spanning marker through last continuation line. Content
/// is recovered by slicing the source with `position`.
#[derive(Debug, Clone)]
pub struct ListItemNode {
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct ListNode {
    pub items: Vec<ListItemNode>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct HtmlNode {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct ParagraphNode {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub enum DocNode {
    Heading(HeadingNode),
    List(ListNode),
    Paragraph(ParagraphNode),
    Html(HtmlNode),
    Rule(Position),
}

/// Tokenize `body` (the document with frontmatter and settings block
/// already peeled off) into top-level nodes. `base` is the byte offset of
/// `body` within the full document; all positions are document-absolute.
pub fn parse_document(body: &str, base: usize, index: &LineIndex) -> Vec<DocNode> {
    let parser = Parser::new_ext(body, Options::empty());

    let mut nodes = Vec::new();
    let mut list_depth = 0usize;
    let mut current_items: Vec<ListItemNode> = Vec::new();
    let mut current_list_span: Range<usize> = 0..0;

    let abs = |span: &Range<usize>| (base + span.start)..(base + span.end);

    for (event, span) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::List(_)) => {
                if list_depth == 0 {
                    current_items = Vec::new();
                    current_list_span = span.clone();
                }
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    nodes.push(DocNode::List(ListNode {
                        items: std::mem::take(&mut current_items),
                        position: index.position(&abs(&current_list_span)),
                    }));
                }
            }
            Event::Start(Tag::Item) => {
                // Nested lists belong to their parent item's span.
                if list_depth == 1 {
                    current_items.push(ListItemNode {
                        position: index.position(&abs(&span)),
                    });
                }
            }
            _ if list_depth > 0 => {}
            Event::Start(Tag::Heading { level, .. }) => {
                nodes.push(DocNode::Heading(HeadingNode {
                    level: heading_level_to_u8(level),
                    text: heading_text(&body[span.clone()]),
                    position: index.position(&abs(&span)),
                }));
            }
            Event::Start(Tag::Paragraph) => {
                nodes.push(DocNode::Paragraph(ParagraphNode {
                    text: body[span.clone()].trim().to_string(),
                    position: index.position(&abs(&span)),
                }));
            }
            Event::Start(Tag::HtmlBlock) => {
                nodes.push(DocNode::Html(HtmlNode {
                    text: body[span.clone()].trim().to_string(),
                    position: index.position(&abs(&span)),
                }));
            }
            Event::Rule => {
                nodes.push(DocNode::Rule(index.position(&abs(&span))));
            }
            _ => {}
        }
    }

    nodes
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Recover heading text from its raw source slice. ATX markers (and a
/// closing marker sequence, if any) are stripped; inline markdown inside
/// the title is kept verbatim.
fn heading_text(slice: &str) -> String {
    let line = slice.trim();
    let stripped = line.trim_start_matches('#');
    let mut text = if stripped.len() == line.len() {
        // Setext heading: the title is the first line, the underline follows.
        line.lines().next().unwrap_or("").trim()
    } else {
        stripped.trim_start()
    };
    let without_closing = text.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with(char::is_whitespace) {
        text = without_closing.trim_end();
    }
    text.to_string()
}
