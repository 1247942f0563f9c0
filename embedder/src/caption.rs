use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::{Captures, Regex};

/// Characters escaped in a file path. URI reserved and mark characters
/// (`; , / ? : @ & = + $ - _ . ! ~ * ' ( ) #`) are kept as they are.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// `![[file|portrait]]`, where the file name holds neither `|` nor `]`.
static PORTRAIT_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^|\]]+)\|portrait\]\]").expect("portrait embed pattern is valid")
});

/// Rewrite `![[file|portrait]]` into `![portrait](file)` so stylesheets can
/// target the alt text. Other embed modifiers are left as they are.
pub fn normalize_captions(text: &str) -> String {
    PORTRAIT_EMBED
        .replace_all(text, |caps: &Captures<'_>| {
            format!("![portrait]({})", utf8_percent_encode(&caps[1], PATH_ESCAPES))
        })
        .into_owned()
}
