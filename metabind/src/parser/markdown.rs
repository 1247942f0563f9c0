use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd,
};

use crate::document::{ColumnAlignment, Document, DocumentNode, InlineNode};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a Markdown body (frontmatter already removed) into a document tree.
pub fn parse_document(source: &str) -> Document {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events: Vec<Event<'_>> = CmarkParser::new_ext(source, options).collect();

    let mut i = 0;
    let nodes = collect_blocks(&events, &mut i, &|_| false);
    Document { nodes }
}

// ---------------------------------------------------------------------------
// Block level
// ---------------------------------------------------------------------------

/// Collect block nodes until a matching End tag (or the end of the stream).
fn collect_blocks(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<DocumentNode> {
    let mut nodes = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }

            Event::Start(Tag::Paragraph) => {
                *i += 1;
                let inlines = collect_inlines(events, i, &|e| matches!(e, TagEnd::Paragraph));
                nodes.push(DocumentNode::Paragraph(inlines));
            }

            Event::Start(Tag::Heading { level, .. }) => {
                let level = heading_level_to_u8(level);
                *i += 1;
                let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Heading(_)));
                nodes.push(DocumentNode::Heading { level, content });
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let (language, meta) = match kind {
                    CodeBlockKind::Fenced(info) => split_info_string(info),
                    CodeBlockKind::Indented => (None, None),
                };
                *i += 1;
                let content = collect_text_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
                nodes.push(DocumentNode::CodeBlock {
                    language,
                    meta,
                    content,
                });
            }

            Event::Start(Tag::BlockQuote(_)) => {
                *i += 1;
                let inner = collect_blocks(events, i, &|e| matches!(e, TagEnd::BlockQuote(_)));
                nodes.push(DocumentNode::Blockquote(Document { nodes: inner }));
            }

            Event::Start(Tag::List(Some(start))) => {
                let start = *start;
                *i += 1;
                let items = collect_list_items(events, i);
                nodes.push(DocumentNode::OrderedList { start, items });
            }

            Event::Start(Tag::List(None)) => {
                *i += 1;
                let items = collect_list_items(events, i);
                nodes.push(DocumentNode::UnorderedList { items });
            }

            Event::Start(Tag::Table(alignments)) => {
                let alignments = alignments
                    .iter()
                    .map(|a| match a {
                        pulldown_cmark::Alignment::None => ColumnAlignment::None,
                        pulldown_cmark::Alignment::Left => ColumnAlignment::Left,
                        pulldown_cmark::Alignment::Center => ColumnAlignment::Center,
                        pulldown_cmark::Alignment::Right => ColumnAlignment::Right,
                    })
                    .collect();
                *i += 1;
                let (headers, rows) = collect_table(events, i);
                nodes.push(DocumentNode::Table {
                    alignments,
                    headers,
                    rows,
                });
            }

            Event::Start(Tag::HtmlBlock) => {
                *i += 1;
                let html = collect_text_until(events, i, |e| matches!(e, TagEnd::HtmlBlock));
                nodes.push(DocumentNode::Html(html));
            }

            Event::Rule => {
                nodes.push(DocumentNode::HorizontalRule);
                *i += 1;
            }

            // Tight list items carry their text without a paragraph wrapper.
            _ => {
                let mut inlines = Vec::new();
                while let Some(inline) = parse_inline(events, i) {
                    push_inline(&mut inlines, inline);
                }
                if inlines.is_empty() {
                    *i += 1;
                } else {
                    nodes.push(DocumentNode::Paragraph(inlines));
                }
            }
        }
    }

    nodes
}

/// Collect list items until End(List).
fn collect_list_items(events: &[Event<'_>], i: &mut usize) -> Vec<Document> {
    let mut items = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(TagEnd::List(_)) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Item) => {
                *i += 1;
                let nodes = collect_blocks(events, i, &|e| matches!(e, TagEnd::Item));
                items.push(Document { nodes });
            }
            _ => {
                *i += 1;
            }
        }
    }

    items
}

/// Collect table headers and rows.
fn collect_table(
    events: &[Event<'_>],
    i: &mut usize,
) -> (Vec<Vec<InlineNode>>, Vec<Vec<Vec<InlineNode>>>) {
    let mut headers: Vec<Vec<InlineNode>> = Vec::new();
    let mut rows: Vec<Vec<Vec<InlineNode>>> = Vec::new();
    let mut in_head = false;
    let mut current_row: Vec<Vec<InlineNode>> = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(TagEnd::Table) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::TableHead) => {
                in_head = true;
                current_row = Vec::new();
                *i += 1;
            }
            Event::End(TagEnd::TableHead) => {
                in_head = false;
                headers = std::mem::take(&mut current_row);
                *i += 1;
            }
            Event::Start(Tag::TableRow) => {
                current_row = Vec::new();
                *i += 1;
            }
            Event::End(TagEnd::TableRow) => {
                if !in_head {
                    rows.push(std::mem::take(&mut current_row));
                }
                *i += 1;
            }
            Event::Start(Tag::TableCell) => {
                *i += 1;
                let cell = collect_inlines(events, i, &|e| matches!(e, TagEnd::TableCell));
                current_row.push(cell);
            }
            _ => {
                *i += 1;
            }
        }
    }

    (headers, rows)
}

// ---------------------------------------------------------------------------
// Inline level
// ---------------------------------------------------------------------------

/// Collect inline nodes until a matching End tag.
fn collect_inlines(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<InlineNode> {
    let mut inlines = Vec::new();

    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i] {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        match parse_inline(events, i) {
            Some(inline) => push_inline(&mut inlines, inline),
            None => *i += 1,
        }
    }

    inlines
}

/// Push an inline node, merging adjacent text runs.
fn push_inline(inlines: &mut Vec<InlineNode>, inline: InlineNode) {
    if let (Some(InlineNode::Text(last)), InlineNode::Text(text)) = (inlines.last_mut(), &inline) {
        last.push_str(text);
        return;
    }
    inlines.push(inline);
}

/// Parse one inline node starting at `events[*i]`. Returns `None` without
/// consuming anything when the event does not start an inline.
fn parse_inline(events: &[Event<'_>], i: &mut usize) -> Option<InlineNode> {
    let node = match events.get(*i)? {
        Event::Text(s) => InlineNode::Text(s.to_string()),
        Event::Code(s) => InlineNode::CodeSpan(s.to_string()),
        Event::InlineHtml(s) => InlineNode::Html(s.to_string()),
        Event::SoftBreak => InlineNode::SoftBreak,
        Event::HardBreak => InlineNode::HardBreak,
        Event::Start(Tag::Strong) => {
            *i += 1;
            let children = collect_inlines(events, i, &|e| matches!(e, TagEnd::Strong));
            return Some(InlineNode::Strong(children));
        }
        Event::Start(Tag::Emphasis) => {
            *i += 1;
            let children = collect_inlines(events, i, &|e| matches!(e, TagEnd::Emphasis));
            return Some(InlineNode::Emphasis(children));
        }
        Event::Start(Tag::Strikethrough) => {
            *i += 1;
            let children = collect_inlines(events, i, &|e| matches!(e, TagEnd::Strikethrough));
            return Some(InlineNode::Strikethrough(children));
        }
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => {
            let dest = dest_url.to_string();
            let title = title.to_string();
            *i += 1;
            let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Link));
            return Some(InlineNode::Link {
                dest,
                title,
                content,
            });
        }
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => {
            let dest = dest_url.to_string();
            let title = title.to_string();
            *i += 1;
            let alt = collect_inlines(events, i, &|e| matches!(e, TagEnd::Image));
            return Some(InlineNode::Image { dest, title, alt });
        }
        _ => return None,
    };
    *i += 1;
    Some(node)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Split a fence info string into language (first word) and meta (the rest).
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => {
            let meta = meta.trim();
            let meta = if meta.is_empty() { None } else { Some(meta.to_string()) };
            (Some(lang.to_string()), meta)
        }
        None => (Some(info.to_string()), None),
    }
}

/// Collect all text (and raw HTML) content until a matching End tag.
fn collect_text_until(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    while *i < events.len() {
        match &events[*i] {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Html(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}
