use std::path::Path;

use embedder::{EmbedOptions, Embedder};
use metabind::Note;
use metabind::document::{Document, DocumentNode};

fn parse(source: &str) -> Note {
    metabind::parser::Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn write_note(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn embedder_for(dir: &Path) -> Embedder {
    Embedder::new(EmbedOptions::default().with_content_dir(dir))
}

const PET: &str = "---\nage: 7\ntags: [a, b]\n---\n";

#[test]
fn renders_template_with_frontmatter_fields() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "`=this.age` years, tags: `=this.tags`");

    let mut note = parse(&format!("{PET}```meta-bind-embed\n[[Pet]]\n```\n"));
    let embedded = embedder_for(dir.path()).embed_note(&mut note);

    assert_eq!(embedded, 1);
    assert_eq!(
        note.document.nodes,
        vec![DocumentNode::text_paragraph("7 years, tags: a, b")]
    );
}

#[test]
fn missing_template_leaves_block_unchanged() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    let mut note = parse(&format!("{PET}```meta-bind-embed\n[[Pet]]\n```\n"));
    let before = note.document.clone();
    let embedded = embedder_for(dir.path()).embed_note(&mut note);

    assert_eq!(embedded, 0);
    assert_eq!(note.document, before);
}

#[test]
fn section_suffix_is_ignored_when_loading() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "# Stats\nAge `=this.age`\n");

    let mut note = parse(&format!("{PET}```meta-bind-embed\n[[Pet#Stats]]\n```\n"));
    embedder_for(dir.path()).embed_note(&mut note);

    assert_eq!(
        note.document.nodes,
        vec![DocumentNode::text_paragraph("# Stats\nAge 7\n")]
    );
}

#[test]
fn differently_tagged_blocks_are_ignored() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "rendered");

    let mut note = parse(&format!(
        "{PET}```dataview\n[[Pet]]\n```\n\n```\n[[Pet]]\n```\n\n    [[Pet]]\n"
    ));
    let before = note.document.clone();
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 0);
    assert_eq!(note.document, before);
}

#[test]
fn block_without_wikilink_is_kept() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "rendered");

    let mut note = parse("```meta-bind-embed\nPet\n```\n");
    let before = note.document.clone();
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 0);
    assert_eq!(note.document, before);
}

#[test]
fn empty_template_is_skipped() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Blank.md", "");

    let mut note = parse("```meta-bind-embed\n[[Blank]]\n```\n");
    let before = note.document.clone();
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 0);
    assert_eq!(note.document, before);
}

#[test]
fn replacement_keeps_sibling_order() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "A.md", "alpha");
    write_note(dir.path(), "B.md", "beta");

    let src = "intro\n\n```meta-bind-embed\n[[A]]\n```\n\nmiddle\n\n```meta-bind-embed\n[[Missing]]\n```\n\n```meta-bind-embed\n[[B]]\n```\n\noutro\n";
    let mut note = parse(src);
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 2);

    assert_eq!(
        note.document.nodes,
        vec![
            DocumentNode::text_paragraph("intro"),
            DocumentNode::text_paragraph("alpha"),
            DocumentNode::text_paragraph("middle"),
            DocumentNode::code_block(Some("meta-bind-embed"), "[[Missing]]\n"),
            DocumentNode::text_paragraph("beta"),
            DocumentNode::text_paragraph("outro"),
        ]
    );
}

#[test]
fn nested_blocks_are_embedded() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "npc/Header.md", "Level `=this.stats.level`");

    let src = "---\nstats:\n  level: 3\n---\n> ```meta-bind-embed\n> [[npc/Header]]\n> ```\n\n- item\n\n  ```meta-bind-embed\n  [[npc/Header.md]]\n  ```\n";
    let mut note = parse(src);
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 2);

    let rendered = DocumentNode::text_paragraph("Level 3");
    assert_eq!(
        note.document.nodes[0],
        DocumentNode::Blockquote(Document {
            nodes: vec![rendered.clone()]
        })
    );
    let DocumentNode::UnorderedList { items } = &note.document.nodes[1] else {
        panic!("expected list, got {:?}", note.document.nodes[1]);
    };
    assert_eq!(items[0].nodes[1], rendered);
}

#[test]
fn vault_rooted_link_resolves_under_content_dir() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "npc/Header.md", "hdr");

    let mut note = parse("```meta-bind-embed\n[[/npc/Header]]\n```\n");
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 1);
    assert_eq!(note.document.nodes, vec![DocumentNode::text_paragraph("hdr")]);
}

#[test]
fn embedded_text_is_not_expanded_again() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Outer.md", "```meta-bind-embed\n[[Inner]]\n```\n");
    write_note(dir.path(), "Inner.md", "inner");

    let mut note = parse("```meta-bind-embed\n[[Outer]]\n```\n");
    assert_eq!(embedder_for(dir.path()).embed_note(&mut note), 1);
    assert_eq!(
        note.document.nodes,
        vec![DocumentNode::text_paragraph("```meta-bind-embed\n[[Inner]]\n```\n")]
    );
}

#[test]
fn each_occurrence_reads_the_file_again() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "first");
    let embedder = embedder_for(dir.path());

    let mut one = parse("```meta-bind-embed\n[[Pet]]\n```\n");
    embedder.embed_note(&mut one);
    write_note(dir.path(), "Pet.md", "second");
    let mut two = parse("```meta-bind-embed\n[[Pet]]\n```\n");
    embedder.embed_note(&mut two);

    assert_eq!(one.document.nodes, vec![DocumentNode::text_paragraph("first")]);
    assert_eq!(two.document.nodes, vec![DocumentNode::text_paragraph("second")]);
}

#[test]
fn substitution_runs_before_caption_normalization() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(
        dir.path(),
        "Card.md",
        "![[`=this.portrait`|portrait]]\n![[map.png|wide]]\n",
    );

    let mut note = parse(
        "---\nportrait: Rex (old) photo.png\n---\n```meta-bind-embed\n[[Card]]\n```\n",
    );
    embedder_for(dir.path()).embed_note(&mut note);

    assert_eq!(
        note.document.to_string(),
        "![portrait](Rex%20(old)%20photo.png)\n![[map.png|wide]]\n"
    );
}

#[test]
fn custom_language_marker() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    write_note(dir.path(), "Pet.md", "custom");

    let embedder = Embedder::new(
        EmbedOptions::default()
            .with_content_dir(dir.path())
            .with_language("embed"),
    );
    let mut note = parse("```embed\n[[Pet]]\n```\n\n```meta-bind-embed\n[[Pet]]\n```\n");
    assert_eq!(embedder.embed_note(&mut note), 1);
    assert_eq!(note.document.nodes[0], DocumentNode::text_paragraph("custom"));
    assert!(matches!(note.document.nodes[1], DocumentNode::CodeBlock { .. }));
}

#[test]
fn options_deserialize_with_defaults() {
    let options: EmbedOptions = toml::from_str("content_dir = \"notes\"").unwrap();
    assert_eq!(options.content_dir, Path::new("notes"));
    assert_eq!(options.language, "meta-bind-embed");
    assert!(toml::from_str::<EmbedOptions>("contentDir = \"x\"").is_err());
}
