use std::path::{Component, PathBuf};

/// Extension appended to note identifiers that lack it.
pub const NOTE_EXTENSION: &str = ".md";

/// Resolves note identifiers to files under a content directory and reads them.
/// Every call hits the file system; nothing is cached.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    content_dir: PathBuf,
}

impl TemplateLoader {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        TemplateLoader {
            content_dir: content_dir.into(),
        }
    }

    /// Map an identifier to its file path. A leading `/` roots the identifier
    /// at the content directory. `None` for identifiers that are empty or
    /// step outside the content directory.
    pub fn note_path(&self, identifier: &str) -> Option<PathBuf> {
        if identifier.is_empty() {
            return None;
        }
        let relative = if identifier.ends_with(NOTE_EXTENSION) {
            PathBuf::from(identifier)
        } else {
            PathBuf::from(format!("{}{}", identifier, NOTE_EXTENSION))
        };
        let components: Vec<Component<'_>> = relative
            .components()
            .skip_while(|c| matches!(c, Component::RootDir))
            .collect();
        let contained = components
            .iter()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.content_dir.join(components.iter().collect::<PathBuf>()))
    }

    /// Read the note named by `identifier`. Absent or unreadable notes yield `None`.
    pub fn load(&self, identifier: &str) -> Option<String> {
        let Some(path) = self.note_path(identifier) else {
            tracing::trace!(identifier, "template identifier rejected");
            return None;
        };
        if !path.is_file() {
            tracing::trace!(path = %path.display(), "template note not found");
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::trace!(path = %path.display(), error = %err, "template note unreadable");
                None
            }
        }
    }
}
