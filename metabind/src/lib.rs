pub mod document;
pub mod frontmatter;
pub mod parser;

use crate::document::Document;
use crate::frontmatter::Context;

/// A parsed Markdown note: its frontmatter and its body tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Frontmatter fields, empty when the note has none.
    pub frontmatter: Context,
    /// The note body.
    pub document: Document,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
