pub mod error;
mod markdown;

pub use error::ParseError;
pub use markdown::parse_document;

use crate::Note;
use crate::frontmatter::{self, Context, FrontmatterFormat};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into its frontmatter context and body tree.
    pub fn parse(&self) -> Result<Note, Vec<ParseError>> {
        let (frontmatter, body_start) = match frontmatter::split_frontmatter(&self.source) {
            Some(block) => {
                let context = self
                    .parse_frontmatter(block.format, block.raw, block.raw_span.clone())
                    .map_err(|err| vec![err])?;
                (context, block.body_start)
            }
            None => (Context::default(), 0),
        };

        let body = self.source[body_start..].trim_start_matches('\u{feff}');
        Ok(Note {
            frontmatter,
            document: parse_document(body),
            source_id: self.file_id,
        })
    }

    fn parse_frontmatter(
        &self,
        format: FrontmatterFormat,
        raw: &str,
        span: std::ops::Range<usize>,
    ) -> Result<Context, ParseError> {
        match format {
            FrontmatterFormat::Yaml => match serde_yaml::from_str::<serde_yaml::Value>(raw) {
                Ok(value) => Ok(frontmatter::context_from_yaml(value)),
                Err(e) => {
                    let offset = e.location().map(|loc| loc.index());
                    Err(ParseError::frontmatter(format, e.to_string(), span, offset, self.file_id))
                }
            },
            FrontmatterFormat::Toml => match raw.parse::<toml::Table>() {
                Ok(table) => Ok(frontmatter::context_from_toml(table)),
                Err(e) => {
                    let offset = e.span().map(|s| s.start);
                    Err(ParseError::frontmatter(format, e.message(), span, offset, self.file_id))
                }
            },
        }
    }
}
