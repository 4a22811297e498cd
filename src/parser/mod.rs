pub mod bullets;
pub mod infobox;
pub mod links;
mod scan;
pub mod table;
pub mod text;

use table::{PartialQuest, TableLayout};

/// Two-pass pipeline: index markup → table blocks → quest rows.
pub fn parse_index(markup: &str, class_marker: &str, layout: &TableLayout) -> Vec<PartialQuest> {
    table::find_tables(markup, class_marker)
        .into_iter()
        .flat_map(|block| table::parse_table(block, layout))
        .collect()
}
