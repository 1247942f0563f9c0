use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::frontmatter::FrontmatterFormat;

/// Parse errors with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    /// A malformed frontmatter block. `offset` is the position of the
    /// offending byte inside the block when the underlying parser reports one.
    pub(crate) fn frontmatter(
        format: FrontmatterFormat,
        detail: impl Into<String>,
        block: Range<usize>,
        offset: Option<usize>,
        file_id: usize,
    ) -> Self {
        let kind = match format {
            FrontmatterFormat::Yaml => "YAML",
            FrontmatterFormat::Toml => "TOML",
        };
        let span = match offset {
            Some(at) => {
                let start = (block.start + at).min(block.end);
                start..(start + 1).min(block.end).max(start)
            }
            None => block,
        };
        ParseError::error(format!("invalid {} frontmatter", kind), span, file_id)
            .with_note(detail)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
