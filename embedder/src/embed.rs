use std::sync::LazyLock;

use metabind::Note;
use metabind::document::{Document, DocumentNode};
use metabind::frontmatter::Context;
use regex::Regex;

use crate::caption::normalize_captions;
use crate::loader::TemplateLoader;
use crate::options::EmbedOptions;
use crate::substitute::substitute_fields;

static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("wikilink pattern is valid"));

/// Extract the note identifier from a code block body: the target of the
/// first `[[...]]` with any `#section` suffix dropped.
pub fn template_target(body: &str) -> Option<&str> {
    let caps = WIKILINK.captures(body.trim())?;
    let link = caps.get(1)?.as_str();
    let target = link.split('#').next().unwrap_or(link);
    Some(target.trim())
}

/// Replaces tagged code blocks with their rendered template notes.
#[derive(Debug, Clone)]
pub struct Embedder {
    language: String,
    loader: TemplateLoader,
}

impl Embedder {
    pub fn new(options: EmbedOptions) -> Self {
        Embedder {
            language: options.language,
            loader: TemplateLoader::new(options.content_dir),
        }
    }

    /// Embed templates into a parsed note using its own frontmatter.
    pub fn embed_note(&self, note: &mut Note) -> usize {
        self.embed(&mut note.document, &note.frontmatter)
    }

    /// Walk `document` in order and replace every resolvable tagged code block
    /// with a paragraph holding the rendered template. Returns the number of
    /// blocks replaced. Blocks that cannot be resolved are left untouched.
    pub fn embed(&self, document: &mut Document, context: &Context) -> usize {
        self.embed_nodes(&mut document.nodes, context)
    }

    fn embed_nodes(&self, nodes: &mut [DocumentNode], context: &Context) -> usize {
        let mut embedded = 0;
        for node in nodes.iter_mut() {
            match node {
                DocumentNode::CodeBlock {
                    language: Some(language),
                    content,
                    ..
                } if *language == self.language => {
                    if let Some(rendered) = self.render(content, context) {
                        // The replacement is not revisited.
                        *node = DocumentNode::text_paragraph(rendered);
                        embedded += 1;
                    }
                }
                DocumentNode::Blockquote(inner) => {
                    embedded += self.embed_nodes(&mut inner.nodes, context);
                }
                DocumentNode::OrderedList { items, .. } | DocumentNode::UnorderedList { items } => {
                    for item in items.iter_mut() {
                        embedded += self.embed_nodes(&mut item.nodes, context);
                    }
                }
                _ => {}
            }
        }
        embedded
    }

    /// Resolve, load, and render the template referenced by a code block body.
    fn render(&self, body: &str, context: &Context) -> Option<String> {
        let Some(identifier) = template_target(body) else {
            tracing::trace!("tagged code block has no wikilink");
            return None;
        };
        let template = self.loader.load(identifier)?;
        if template.is_empty() {
            tracing::trace!(identifier, "template note is empty");
            return None;
        }
        let rendered = normalize_captions(&substitute_fields(&template, context));
        tracing::debug!(identifier, "embedded template note");
        Some(rendered)
    }
}

impl Default for Embedder {
    fn default() -> Self {
        Embedder::new(EmbedOptions::default())
    }
}
