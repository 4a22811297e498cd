use std::sync::LazyLock;

use regex::Regex;

use super::text::{clean, TAG_RE};

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static FALLBACK_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\n,;|/]").unwrap());

/// A matched `[[target]]` or `[[target|label]]` construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink<'a> {
    pub start: usize,
    pub end: usize,
    pub target: &'a str,
    pub label: Option<&'a str>,
}

impl<'a> WikiLink<'a> {
    /// Label when one is given, otherwise the target (`[[Foo|]]` shows `Foo`).
    pub fn display(&self) -> &'a str {
        match self.label {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.target,
        }
    }
}

/// Find every well-formed link in document order.
///
/// A `[[` whose closing `]]` comes after another `[[` is skipped in favour of
/// the inner one; links with more than one pipe (file/image syntax) or an
/// empty target are left alone.
pub fn scan_links(text: &str) -> Vec<WikiLink<'_>> {
    let mut links = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find("[[") {
        let open = pos + rel;
        let inner_start = open + 2;
        let Some(close_rel) = text[inner_start..].find("]]") else {
            break;
        };
        let inner_end = inner_start + close_rel;
        let inner = &text[inner_start..inner_end];

        if let Some(nested) = inner.rfind("[[") {
            pos = inner_start + nested;
            continue;
        }

        let mut parts = inner.splitn(3, '|');
        let target = parts.next().unwrap_or_default();
        let label = parts.next();
        let extra = parts.next();

        if extra.is_none() && !target.trim().is_empty() {
            links.push(WikiLink {
                start: open,
                end: inner_end + 2,
                target,
                label,
            });
        }
        pos = inner_end + 2;
    }

    links
}

/// Replace wiki links with their display text; everything else passes through.
pub fn inline(text: &str) -> String {
    let links = scan_links(text);
    if links.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for link in &links {
        out.push_str(&text[last..link.start]);
        out.push_str(link.display());
        last = link.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Cleaned display text of every link, or of every delimited piece when the
/// fragment carries no usable links.
pub fn extract_links(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let found: Vec<String> = scan_links(text)
        .iter()
        .map(|link| clean(link.display()))
        .filter(|label| !label.is_empty())
        .collect();
    if !found.is_empty() {
        return found;
    }

    // Line-break tags separate pieces; other tags go before splitting so a
    // closing tag's slash is not taken for a separator.
    let broken = BR_RE.replace_all(text, "\n");
    let untagged = TAG_RE.replace_all(&broken, "");
    FALLBACK_SPLIT_RE
        .split(&untagged)
        .map(clean)
        .filter(|piece| !piece.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_prefers_label() {
        assert_eq!(inline("[[Foo|Bar]]"), "Bar");
        assert_eq!(inline("[[Foo]]"), "Foo");
    }

    #[test]
    fn inline_keeps_surrounding_text() {
        assert_eq!(
            inline("Talk to [[Celeste]] in [[Speranza|the city]]."),
            "Talk to Celeste in the city."
        );
    }

    #[test]
    fn inline_pipe_trick_uses_target() {
        assert_eq!(inline("[[Foo|]]"), "Foo");
    }

    #[test]
    fn inline_leaves_malformed_in_place() {
        assert_eq!(inline("[[Unclosed link"), "[[Unclosed link");
        assert_eq!(inline("[[]]"), "[[]]");
        assert_eq!(inline("[[File:x.png|thumb|Caption]]"), "[[File:x.png|thumb|Caption]]");
    }

    #[test]
    fn inline_resolves_inner_link_of_nested_construct() {
        assert_eq!(inline("[[Outer [[Inner]] tail"), "[[Outer Inner tail");
    }

    #[test]
    fn extract_links_in_document_order() {
        assert_eq!(extract_links("[[A]], [[B|C]]"), vec!["A", "C"]);
    }

    #[test]
    fn extract_links_cleans_labels() {
        assert_eq!(
            extract_links("[[A|'''Bold''' A]]<br>[[B&amp;C]]"),
            vec!["Bold A", "B&C"]
        );
    }

    #[test]
    fn extract_links_falls_back_to_delimiters() {
        assert_eq!(extract_links("A, B; C"), vec!["A", "B", "C"]);
        assert_eq!(extract_links("One<br/>Two<BR>Three"), vec!["One", "Two", "Three"]);
        assert_eq!(extract_links("N/A"), vec!["N", "A"]);
    }

    #[test]
    fn extract_links_fallback_strips_tags() {
        assert_eq!(extract_links("<small>Alpha</small>\nBeta"), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn extract_links_empty() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("  ").is_empty());
    }

    #[test]
    fn scan_reports_offsets() {
        let links = scan_links("x [[A|B]] y");
        assert_eq!(links.len(), 1);
        assert_eq!((links[0].start, links[0].end), (2, 9));
        assert_eq!(links[0].target, "A");
        assert_eq!(links[0].label, Some("B"));
    }
}
