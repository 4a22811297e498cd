//! Delimiter-pair scanning shared by the link, table and template readers.
//!
//! Nothing here fails: unbalanced input just produces fewer matches.

/// Split `text` on `sep` wherever it sits outside `[[ ]]` and `{{ }}` pairs.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut links = 0usize;
    let mut templates = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match &bytes[i..] {
            [b'[', b'[', ..] => {
                links += 1;
                i += 2;
            }
            [b']', b']', ..] if links > 0 => {
                links -= 1;
                i += 2;
            }
            [b'{', b'{', ..] => {
                templates += 1;
                i += 2;
            }
            [b'}', b'}', ..] if templates > 0 => {
                templates -= 1;
                i += 2;
            }
            [b, ..] if *b == sep && links == 0 && templates == 0 => {
                parts.push(&text[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Offset of the `close` that balances an `open` consumed just before `from`.
pub fn balanced_close(text: &str, from: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;
    while i < text.len() {
        let rest = &text.as_bytes()[i..];
        if rest.starts_with(open.as_bytes()) {
            depth += 1;
            i += open.len();
        } else if rest.starts_with(close.as_bytes()) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += close.len();
        } else {
            i += 1;
        }
    }
    None
}
