use std::sync::LazyLock;

use regex::Regex;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
pub(crate) static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>").unwrap());
static QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'{2,}").unwrap());

/// Reduce a fragment of wiki/HTML markup to plain text.
///
/// Decodes entities, drops comments, turns tags into word breaks, removes
/// bold/italic quote runs and collapses whitespace. The result is a fixed
/// point: `clean(&clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    // Every pass that changes the text either shortens it or only rewrites
    // whitespace, so this terminates.
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let decoded = decode_entities(text.trim());
    let uncommented = COMMENT_RE.replace_all(&decoded, "");
    let untagged = TAG_RE.replace_all(&uncommented, " ");
    let unquoted = QUOTES_RE.replace_all(&untagged, "");
    unquoted.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode entities until nothing decodable is left (`&amp;lt;` -> `<`).
fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let decoded = html_escape::decode_html_entities(&current).into_owned();
        if decoded == current {
            return current;
        }
        current = decoded;
    }
}
