use std::sync::LazyLock;

use anyhow::{ensure, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::bullets::bullets;
use super::links::inline;
use super::scan::split_top_level;
use super::text::clean;

static ROW_SEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|-+(?:\s+[^\n]*=[^\n]*)?$").unwrap());
static CELL_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\|").unwrap());
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#).unwrap()
});
static CELL_ATTRS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:[A-Za-z-]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'|]+)\s*)+$"#).unwrap()
});

/// What a table column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Trader,
    #[serde(alias = "required_location")]
    Location,
    Objective,
    Reward,
    /// A column the catalog does not keep.
    Skip,
}

/// Column order of the quest tables, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    columns: Vec<Column>,
}

impl TableLayout {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        ensure!(
            columns.contains(&Column::Name),
            "table layout {:?} has no name column",
            columns
        );
        Ok(TableLayout { columns })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            columns: vec![
                Column::Name,
                Column::Trader,
                Column::Location,
                Column::Objective,
                Column::Reward,
            ],
        }
    }
}

/// A quest row before its previous/next links are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialQuest {
    pub name: String,
    pub trader: String,
    pub required_location: String,
    pub objective: Vec<String>,
    pub reward: Vec<String>,
}

/// Bodies of every `{| ... |}` table whose class list holds all tokens of
/// `class_marker`, in document order.
///
/// Nested tables are matched by depth; a table that never closes is skipped.
pub fn find_tables<'a>(markup: &'a str, class_marker: &str) -> Vec<&'a str> {
    let wanted: Vec<String> = class_marker
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut open: Vec<(usize, bool)> = Vec::new();
    let mut found: Vec<(usize, &str)> = Vec::new();
    let mut offset = 0;

    for line in markup.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if let Some(attrs) = trimmed.strip_prefix("{|") {
            open.push((offset, has_classes(attrs, &wanted)));
        } else if trimmed.starts_with("|}") {
            if let Some((body_start, true)) = open.pop() {
                found.push((body_start, &markup[body_start..line_start]));
            }
        }
    }

    let unterminated = open.iter().filter(|(_, keep)| *keep).count();
    if unterminated > 0 {
        warn!("Skipping {} unterminated table(s)", unterminated);
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, body)| body).collect()
}

fn has_classes(attrs: &str, wanted: &[String]) -> bool {
    let Some(caps) = CLASS_RE.captures(attrs) else {
        return wanted.is_empty();
    };
    let value = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str())
        .to_lowercase();
    let classes: Vec<&str> = value.split_whitespace().collect();
    wanted.iter().all(|w| classes.contains(&w.as_str()))
}

/// Parse one table body into quest rows, mapping cells through `layout`.
pub fn parse_table(block: &str, layout: &TableLayout) -> Vec<PartialQuest> {
    split_rows(&block.replace("\r\n", "\n"))
        .iter()
        .filter_map(|row| parse_row(row, layout))
        .collect()
}

/// Split a table body at `|-` separator lines.
fn split_rows(body: &str) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current = String::new();
    for line in body.split_inclusive('\n') {
        if ROW_SEP_RE.is_match(line.trim()) {
            rows.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
        }
    }
    rows.push(current);
    rows
}

fn parse_row(row: &str, layout: &TableLayout) -> Option<PartialQuest> {
    let trimmed = row.trim();
    if trimmed.is_empty() || trimmed.starts_with('!') {
        return None;
    }

    let row = row.trim_start_matches('\n').trim_start_matches('|').trim();
    let width = layout.width();
    // The last cell keeps any further "\n|" so reward links survive intact.
    let mut cells: Vec<&str> = CELL_SEP_RE.splitn(row, width).collect();
    cells.resize(width, "");

    let mut quest = PartialQuest::default();
    for (column, cell) in layout.columns().iter().zip(cells) {
        let cell = strip_cell_attributes(cell.trim().trim_start_matches('!').trim());
        match column {
            Column::Name => quest.name = plain(cell),
            Column::Trader => quest.trader = plain(cell),
            Column::Location => quest.required_location = plain(cell),
            Column::Objective => quest.objective = bullets(cell),
            Column::Reward => quest.reward = bullets(cell),
            Column::Skip => {}
        }
    }

    if !is_quest_name(&quest.name) {
        debug!("Dropping row with name {:?}", quest.name);
        return None;
    }
    Some(quest)
}

fn plain(cell: &str) -> String {
    clean(&inline(cell))
}

/// Quest names open with an ASCII letter or digit.
fn is_quest_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Drop a leading `style="..." |` attribute section from a cell.
fn strip_cell_attributes(cell: &str) -> &str {
    let first_line = cell.lines().next().unwrap_or_default();
    let parts = split_top_level(first_line, b'|');
    if parts.len() < 2 || !CELL_ATTRS_RE.is_match(parts[0]) {
        return cell;
    }
    cell[parts[0].len() + 1..].trim()
}
