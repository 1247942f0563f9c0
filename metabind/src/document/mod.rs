use std::fmt;

/// A Document is an ordered sequence of block nodes parsed from Markdown.
/// Blockquotes and list items own nested documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<DocumentNode>,
}

impl Document {
    /// A document holding a single paragraph of plain text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Document {
            nodes: vec![DocumentNode::text_paragraph(text)],
        }
    }
}

/// A single block-level node in the Markdown tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    Paragraph(Vec<InlineNode>),
    Heading {
        level: u8,
        content: Vec<InlineNode>,
    },
    /// A fenced or indented code block. For fenced blocks the info string is
    /// split into the language (first word) and the remaining meta text.
    CodeBlock {
        language: Option<String>,
        meta: Option<String>,
        content: String,
    },
    Blockquote(Document),
    Table {
        alignments: Vec<ColumnAlignment>,
        headers: Vec<Vec<InlineNode>>,
        rows: Vec<Vec<Vec<InlineNode>>>,
    },
    OrderedList {
        start: u64,
        items: Vec<Document>,
    },
    UnorderedList {
        items: Vec<Document>,
    },
    /// Raw HTML block, kept verbatim.
    Html(String),

    // Separator
    HorizontalRule,
}

impl DocumentNode {
    pub fn text_paragraph(text: impl Into<String>) -> Self {
        DocumentNode::Paragraph(vec![InlineNode::Text(text.into())])
    }

    pub fn code_block(language: Option<&str>, content: impl Into<String>) -> Self {
        DocumentNode::CodeBlock {
            language: language.map(str::to_string),
            meta: None,
            content: content.into(),
        }
    }
}

/// Inline elements that appear within a line of text.
/// Inline types nest freely within one another.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Strong(Vec<InlineNode>),
    Emphasis(Vec<InlineNode>),
    Strikethrough(Vec<InlineNode>),
    CodeSpan(String),
    Link {
        dest: String,
        title: String,
        content: Vec<InlineNode>,
    },
    Image {
        dest: String,
        title: String,
        alt: Vec<InlineNode>,
    },
    Html(String),
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

impl ColumnAlignment {
    fn delimiter(self) -> &'static str {
        match self {
            ColumnAlignment::None => "---",
            ColumnAlignment::Left => ":---",
            ColumnAlignment::Center => ":---:",
            ColumnAlignment::Right => "---:",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

fn write_inlines(f: &mut fmt::Formatter<'_>, inlines: &[InlineNode]) -> fmt::Result {
    for inline in inlines {
        write!(f, "{}", inline)?;
    }
    Ok(())
}

/// Write `text` with `marker` before the first line and continuation lines
/// indented to the marker's width.
fn write_list_item(f: &mut fmt::Formatter<'_>, marker: &str, text: &str) -> fmt::Result {
    let pad = " ".repeat(marker.len());
    let mut lines = text.lines();
    writeln!(f, "{}{}", marker, lines.next().unwrap_or(""))?;
    for line in lines {
        if line.is_empty() {
            writeln!(f)?;
        } else {
            writeln!(f, "{}{}", pad, line)?;
        }
    }
    Ok(())
}

impl fmt::Display for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentNode::Paragraph(inlines) => {
                let text: String = inlines.iter().map(ToString::to_string).collect();
                writeln!(f, "{}", text.trim_end_matches('\n'))
            }
            DocumentNode::Heading { level, content } => {
                write!(f, "{} ", "#".repeat(*level as usize))?;
                write_inlines(f, content)?;
                writeln!(f)
            }
            DocumentNode::CodeBlock {
                language,
                meta,
                content,
            } => {
                write!(f, "```")?;
                if let Some(lang) = language {
                    write!(f, "{}", lang)?;
                }
                if let Some(meta) = meta {
                    write!(f, " {}", meta)?;
                }
                writeln!(f)?;
                write!(f, "{}", content)?;
                if !content.is_empty() && !content.ends_with('\n') {
                    writeln!(f)?;
                }
                writeln!(f, "```")
            }
            DocumentNode::Blockquote(doc) => {
                let text = doc.to_string();
                for line in text.lines() {
                    if line.is_empty() {
                        writeln!(f, ">")?;
                    } else {
                        writeln!(f, "> {}", line)?;
                    }
                }
                Ok(())
            }
            DocumentNode::Table {
                alignments,
                headers,
                rows,
            } => {
                write!(f, "|")?;
                for header in headers {
                    write!(f, " ")?;
                    write_inlines(f, header)?;
                    write!(f, " |")?;
                }
                writeln!(f)?;
                write!(f, "|")?;
                for i in 0..headers.len() {
                    let align = alignments.get(i).copied().unwrap_or(ColumnAlignment::None);
                    write!(f, "{}|", align.delimiter())?;
                }
                writeln!(f)?;
                for row in rows {
                    write!(f, "|")?;
                    for cell in row {
                        write!(f, " ")?;
                        write_inlines(f, cell)?;
                        write!(f, " |")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            DocumentNode::OrderedList { start, items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = format!("{}. ", *start as usize + i);
                    write_list_item(f, &marker, &item.to_string())?;
                }
                Ok(())
            }
            DocumentNode::UnorderedList { items } => {
                for item in items {
                    write_list_item(f, "- ", &item.to_string())?;
                }
                Ok(())
            }
            DocumentNode::Html(html) => {
                write!(f, "{}", html)?;
                if !html.ends_with('\n') {
                    writeln!(f)?;
                }
                Ok(())
            }
            DocumentNode::HorizontalRule => writeln!(f, "---"),
        }
    }
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineNode::Text(s) => write!(f, "{}", s),
            InlineNode::Strong(children) => {
                write!(f, "**")?;
                write_inlines(f, children)?;
                write!(f, "**")
            }
            InlineNode::Emphasis(children) => {
                write!(f, "*")?;
                write_inlines(f, children)?;
                write!(f, "*")
            }
            InlineNode::Strikethrough(children) => {
                write!(f, "~~")?;
                write_inlines(f, children)?;
                write!(f, "~~")
            }
            InlineNode::CodeSpan(code) => {
                if code.contains('`') {
                    write!(f, "`` {} ``", code)
                } else {
                    write!(f, "`{}`", code)
                }
            }
            InlineNode::Link {
                dest,
                title,
                content,
            } => {
                write!(f, "[")?;
                write_inlines(f, content)?;
                write!(f, "]({}", dest)?;
                if !title.is_empty() {
                    write!(f, " \"{}\"", title)?;
                }
                write!(f, ")")
            }
            InlineNode::Image { dest, title, alt } => {
                write!(f, "![")?;
                write_inlines(f, alt)?;
                write!(f, "]({}", dest)?;
                if !title.is_empty() {
                    write!(f, " \"{}\"", title)?;
                }
                write!(f, ")")
            }
            InlineNode::Html(html) => write!(f, "{}", html),
            InlineNode::SoftBreak => writeln!(f),
            InlineNode::HardBreak => write!(f, "\\\n"),
        }
    }
}
