use std::sync::LazyLock;

use regex::Regex;

use super::links::inline;
use super::text::clean;

static DELIM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[,;/]\s*").unwrap());

/// Turn a table cell into list items.
///
/// Objective and reward cells come either as `*` bullet lists or as one
/// delimited line; bullets win when any are present.
pub fn bullets(cell: &str) -> Vec<String> {
    if cell.trim().is_empty() {
        return Vec::new();
    }

    let items: Vec<String> = cell
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('*'))
        .map(|item| clean(&inline(item.trim_start_matches('*').trim())))
        .filter(|item| !item.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }

    let plain = clean(&inline(cell));
    DELIM_RE
        .split(&plain)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
