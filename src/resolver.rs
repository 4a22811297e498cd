use tracing::warn;

use crate::fetcher::PageFetcher;
use crate::parser::infobox::{field, find_template};
use crate::parser::links::extract_links;

/// Quests listed before and after one quest on its own page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestLinks {
    pub previous: Vec<String>,
    pub next: Vec<String>,
}

/// Page title for a quest name (`Clearer Skies` -> `Clearer_Skies`).
pub fn page_title(name: &str) -> String {
    name.replace(' ', "_")
}

/// Fetch a quest's page and read its previous/next quests.
///
/// Fetch failures stay local: they are logged and give empty lists.
pub fn resolve_links<F>(fetcher: &F, name: &str, template: &str) -> QuestLinks
where
    F: PageFetcher + ?Sized,
{
    match fetcher.fetch(&page_title(name)) {
        Ok(markup) => links_from_markup(&markup, template),
        Err(e) => {
            warn!("Error fetching quest page for {}: {}", name, e);
            QuestLinks::default()
        }
    }
}

pub fn links_from_markup(markup: &str, template: &str) -> QuestLinks {
    let Some(block) = find_template(markup, template) else {
        return QuestLinks::default();
    };
    QuestLinks {
        previous: extract_links(field(block, "previous")),
        next: extract_links(field(block, "next")),
    }
}
