use std::sync::LazyLock;

use metabind::frontmatter::{Context, FieldValue, Lookup};
use regex::{Captures, Regex};

/// Inline code of the form `=this.path`, with optional whitespace after `=`
/// and before the closing backtick.
static FIELD_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`=\s*this\.([a-zA-Z0-9_.-]+)\s*`").expect("field reference pattern is valid")
});

/// Replace every `` `=this.<path>` `` in `text` with the value found at
/// `<path>` in `context`. Missing and null values become the empty string.
pub fn substitute_fields(text: &str, context: &Context) -> String {
    FIELD_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| render(context.lookup(&caps[1])))
        .into_owned()
}

fn render(lookup: Lookup<'_>) -> String {
    match lookup {
        Lookup::Found(FieldValue::List(items)) => items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Lookup::Found(value) => value.to_string(),
        Lookup::MissingSegment | Lookup::NullValue => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(yaml: &str) -> Context {
        let source = format!("---\n{}---\n", yaml);
        metabind::parser::Parser::new(source, 0)
            .parse()
            .unwrap()
            .frontmatter
    }

    #[test]
    fn replaces_scalars_and_lists() {
        let ctx = context("age: 7\ntags: [a, b]\nalive: true\nweight: 4.5\n");
        assert_eq!(
            substitute_fields("`=this.age` years, tags: `=this.tags`", &ctx),
            "7 years, tags: a, b"
        );
        assert_eq!(substitute_fields("`=this.alive`/`=this.weight`", &ctx), "true/4.5");
    }

    #[test]
    fn whitespace_inside_the_span_is_allowed() {
        let ctx = context("name: Rex\n");
        assert_eq!(substitute_fields("`= this.name `", &ctx), "Rex");
        assert_eq!(substitute_fields("`=\tthis.name`", &ctx), "Rex");
    }

    #[test]
    fn dotted_paths_walk_nested_maps() {
        let ctx = context("stats:\n  str: 12\n  skills: [swim, fetch]\n");
        assert_eq!(substitute_fields("STR `=this.stats.str`", &ctx), "STR 12");
        assert_eq!(substitute_fields("`=this.stats.skills`", &ctx), "swim, fetch");
        assert_eq!(substitute_fields("`=this.stats.skills.1`", &ctx), "fetch");
    }

    #[test]
    fn missing_and_null_become_empty() {
        let ctx = context("owner: null\nstats: {}\n");
        assert_eq!(substitute_fields("[`=this.name`]", &ctx), "[]");
        assert_eq!(substitute_fields("[`=this.owner`]", &ctx), "[]");
        assert_eq!(substitute_fields("[`=this.owner.name`]", &ctx), "[]");
        assert_eq!(substitute_fields("[`=this.stats.str.value`]", &ctx), "[]");
        assert_eq!(substitute_fields("[`=this.a..b`]", &Context::new()), "[]");
    }

    #[test]
    fn other_inline_code_is_untouched() {
        let ctx = context("age: 7\n");
        let text = "`this.age` `= that.age` `=this.` `=this.age + 1` `code`";
        assert_eq!(substitute_fields(text, &ctx), text);
    }

    #[test]
    fn substitution_is_idempotent_once_resolved() {
        let ctx = context("age: 7\ntags: [a, b]\n");
        let once = substitute_fields("`=this.age` and `=this.tags`", &ctx);
        assert_eq!(substitute_fields(&once, &ctx), once);
    }
}
