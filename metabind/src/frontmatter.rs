use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// A frontmatter value. Mirrors the shapes YAML and TOML frontmatter can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Access a child by path segment: a key for maps, a numeric index for lists.
    fn child(&self, segment: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Map(map) => map.get(segment),
            FieldValue::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(n) => {
                if n.is_finite() && *n == n.floor() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            FieldValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Result of resolving a dotted field path against a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// Every segment resolved to a non-null value.
    Found(&'a FieldValue),
    /// Some segment was absent (or indexed into a scalar).
    MissingSegment,
    /// An intermediate or final value was null.
    NullValue,
}

/// Per-document frontmatter fields, used as the substitution context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    fields: BTreeMap<String, FieldValue>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a dotted path such as `stats.str` or `tags.0`.
    pub fn lookup(&self, path: &str) -> Lookup<'_> {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return Lookup::MissingSegment;
        };
        let Some(mut current) = self.fields.get(first) else {
            return Lookup::MissingSegment;
        };
        for segment in segments {
            if current.is_null() {
                return Lookup::NullValue;
            }
            match current.child(segment) {
                Some(next) => current = next,
                None => return Lookup::MissingSegment,
            }
        }
        if current.is_null() {
            Lookup::NullValue
        } else {
            Lookup::Found(current)
        }
    }
}

impl FromIterator<(String, FieldValue)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Context {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Frontmatter block extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrontmatterFormat {
    /// `---` delimited YAML.
    Yaml,
    /// `+++` delimited TOML.
    Toml,
}

impl FrontmatterFormat {
    fn delimiter(self) -> &'static str {
        match self {
            FrontmatterFormat::Yaml => "---",
            FrontmatterFormat::Toml => "+++",
        }
    }
}

/// A frontmatter block located at the top of a source text.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterBlock<'a> {
    pub format: FrontmatterFormat,
    /// The raw text between the delimiters.
    pub raw: &'a str,
    /// Byte range of `raw` in the source.
    pub raw_span: Range<usize>,
    /// Byte offset where the body starts.
    pub body_start: usize,
}

/// Locate a leading frontmatter block. Returns `None` when the source does not
/// open with a delimiter line or the block is never closed.
pub fn split_frontmatter(source: &str) -> Option<FrontmatterBlock<'_>> {
    let bom = if source.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    let text = &source[bom..];

    let format = [FrontmatterFormat::Yaml, FrontmatterFormat::Toml]
        .into_iter()
        .find(|format| {
            let rest = text.strip_prefix(format.delimiter());
            matches!(rest, Some(r) if r.starts_with('\n') || r.starts_with("\r\n"))
        })?;
    let delimiter = format.delimiter();

    let newline = if text[delimiter.len()..].starts_with("\r\n") { 2 } else { 1 };
    let open_len = delimiter.len() + newline;
    let raw_start = bom + open_len;

    // Walk lines until a closing delimiter line.
    let mut offset = raw_start;
    for line in source[raw_start..].split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == delimiter {
            return Some(FrontmatterBlock {
                format,
                raw: &source[raw_start..offset],
                raw_span: raw_start..offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert a parsed YAML document into a context. A null or non-mapping root
/// yields an empty context.
pub fn context_from_yaml(value: serde_yaml::Value) -> Context {
    match FieldValue::from(value) {
        FieldValue::Map(map) => Context { fields: map },
        _ => Context::default(),
    }
}

/// Convert a parsed TOML table into a context.
pub fn context_from_toml(table: toml::Table) -> Context {
    table
        .into_iter()
        .map(|(key, value)| (key, FieldValue::from(value)))
        .collect()
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl From<serde_yaml::Value> for FieldValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => FieldValue::Null,
            serde_yaml::Value::Bool(b) => FieldValue::Boolean(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => FieldValue::String(s),
            serde_yaml::Value::Sequence(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => FieldValue::Map(
                mapping
                    .into_iter()
                    .filter_map(|(k, v)| yaml_key(k).map(|k| (k, FieldValue::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => FieldValue::from(tagged.value),
        }
    }
}

impl From<toml::Value> for FieldValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => FieldValue::String(s),
            toml::Value::Integer(n) => FieldValue::Integer(n),
            toml::Value::Float(n) => FieldValue::Float(n),
            toml::Value::Boolean(b) => FieldValue::Boolean(b),
            toml::Value::Datetime(dt) => FieldValue::String(dt.to_string()),
            toml::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            toml::Value::Table(table) => FieldValue::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet() -> Context {
        let yaml = "age: 7\ntags: [a, b]\nowner: ~\nstats:\n  str: 12\n  dex: null\n";
        context_from_yaml(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn lookup_top_level_and_nested() {
        let ctx = pet();
        assert_eq!(ctx.lookup("age"), Lookup::Found(&FieldValue::Integer(7)));
        assert_eq!(ctx.lookup("stats.str"), Lookup::Found(&FieldValue::Integer(12)));
    }

    #[test]
    fn lookup_distinguishes_missing_from_null() {
        let ctx = pet();
        assert_eq!(ctx.lookup("name"), Lookup::MissingSegment);
        assert_eq!(ctx.lookup("stats.wis"), Lookup::MissingSegment);
        assert_eq!(ctx.lookup("owner"), Lookup::NullValue);
        assert_eq!(ctx.lookup("owner.name"), Lookup::NullValue);
        assert_eq!(ctx.lookup("stats.dex"), Lookup::NullValue);
        assert_eq!(ctx.lookup("age.value"), Lookup::MissingSegment);
    }

    #[test]
    fn lookup_indexes_lists() {
        let ctx = pet();
        assert_eq!(
            ctx.lookup("tags.1"),
            Lookup::Found(&FieldValue::String("b".into()))
        );
        assert_eq!(ctx.lookup("tags.2"), Lookup::MissingSegment);
    }

    #[test]
    fn display_formats_numbers_and_lists() {
        assert_eq!(FieldValue::Float(3.0).to_string(), "3");
        assert_eq!(FieldValue::Float(2.5).to_string(), "2.5");
        let list = FieldValue::List(vec![
            FieldValue::String("a".into()),
            FieldValue::Null,
            FieldValue::Integer(3),
        ]);
        assert_eq!(list.to_string(), "a, , 3");
    }

    #[test]
    fn display_flattens_nested_lists_and_sorts_maps() {
        let value = FieldValue::from(
            serde_yaml::from_str::<serde_yaml::Value>("[a, [b, c], {z: 1, k: v}]").unwrap(),
        );
        assert_eq!(value.to_string(), "a, b, c, {k: v, z: 1}");
    }

    #[test]
    fn split_yaml_frontmatter() {
        let src = "---\ntitle: Rex\n---\n# Body\n";
        let block = split_frontmatter(src).unwrap();
        assert_eq!(block.format, FrontmatterFormat::Yaml);
        assert_eq!(block.raw, "title: Rex\n");
        assert_eq!(&src[block.body_start..], "# Body\n");
    }

    #[test]
    fn split_toml_frontmatter_with_crlf() {
        let src = "+++\r\ntitle = \"Rex\"\r\n+++\r\nbody";
        let block = split_frontmatter(src).unwrap();
        assert_eq!(block.format, FrontmatterFormat::Toml);
        assert_eq!(block.raw, "title = \"Rex\"\r\n");
        assert_eq!(&src[block.body_start..], "body");
    }

    #[test]
    fn unterminated_or_absent_frontmatter() {
        assert!(split_frontmatter("---\ntitle: Rex\n").is_none());
        assert!(split_frontmatter("# Heading\n---\n").is_none());
        assert!(split_frontmatter("----\n").is_none());
    }

    #[test]
    fn non_mapping_yaml_root_is_empty() {
        let ctx = context_from_yaml(serde_yaml::from_str("- a\n- b\n").unwrap());
        assert!(ctx.is_empty());
    }
}
