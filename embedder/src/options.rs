use std::path::PathBuf;

use serde::Deserialize;

/// Code blocks tagged with this language are replaced by their template note.
pub const DEFAULT_LANGUAGE: &str = "meta-bind-embed";

/// Where template notes live unless configured otherwise.
pub const DEFAULT_CONTENT_DIR: &str = "content";

/// Options for the embedding transform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedOptions {
    /// Base directory that template identifiers resolve against.
    pub content_dir: PathBuf,
    /// The code block language marker, compared exactly.
    pub language: String,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        EmbedOptions {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl EmbedOptions {
    pub fn with_content_dir(mut self, content_dir: impl Into<PathBuf>) -> Self {
        self.content_dir = content_dir.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
