use anyhow::Result;
use indicatif::ProgressBar;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;
use crate::fetcher::{FetchError, PageFetcher};
use crate::parser;
use crate::parser::table::{PartialQuest, TableLayout};
use crate::resolver::{resolve_links, QuestLinks};
use crate::store::QuestRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to fetch index page {title}: {source}")]
    Index {
        title: String,
        #[source]
        source: FetchError,
    },
    #[error("index page {0} is empty")]
    EmptyIndex(String),
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// What a catalog run needs beyond a fetcher.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub index_title: String,
    pub table_class: String,
    pub infobox_template: String,
    pub layout: TableLayout,
    pub sentinel: Vec<String>,
    pub workers: usize,
    /// Resolve and keep only the first N quests.
    pub limit: Option<usize>,
}

impl CatalogOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(CatalogOptions {
            index_title: settings.index_title.clone(),
            table_class: settings.table_class.clone(),
            infobox_template: settings.infobox_template.clone(),
            layout: TableLayout::new(settings.columns.clone())?,
            sentinel: settings.sentinel.clone(),
            workers: settings.workers,
            limit: None,
        })
    }
}

/// Fetch the index page, parse its quest tables and resolve every quest's
/// previous/next links, one page fetch per quest.
///
/// Only a failure on the index page aborts; records keep table/row order
/// whatever the worker count.
pub fn build_catalog<F>(
    fetcher: &F,
    opts: &CatalogOptions,
    pb: &ProgressBar,
) -> Result<Vec<QuestRecord>, CatalogError>
where
    F: PageFetcher + Sync + ?Sized,
{
    let markup = fetcher
        .fetch(&opts.index_title)
        .map_err(|source| CatalogError::Index {
            title: opts.index_title.clone(),
            source,
        })?;
    if markup.trim().is_empty() {
        return Err(CatalogError::EmptyIndex(opts.index_title.clone()));
    }

    let mut partials = parser::parse_index(&markup, &opts.table_class, &opts.layout);
    if partials.is_empty() {
        warn!("No quest tables found on {}", opts.index_title);
    }
    if let Some(limit) = opts.limit {
        partials.truncate(limit);
    }
    info!("Found {} quests on {}", partials.len(), opts.index_title);

    pb.set_length(partials.len() as u64);
    let resolve = |partial: PartialQuest| {
        let links = resolve_links(fetcher, &partial.name, &opts.infobox_template);
        let record = assemble(partial, links, &opts.sentinel);
        info!(
            "Parsed quest {} ({} previous, {} next)",
            record.name,
            record.previous_quests.len(),
            record.next_quests.len()
        );
        pb.inc(1);
        record
    };

    let records: Vec<QuestRecord> = if opts.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.workers)
            .build()?;
        pool.install(|| partials.into_par_iter().map(resolve).collect())
    } else {
        partials.into_iter().map(resolve).collect()
    };

    pb.finish_and_clear();
    info!("Parsed {} quests", records.len());
    Ok(records)
}

fn assemble(partial: PartialQuest, links: QuestLinks, sentinel: &[String]) -> QuestRecord {
    QuestRecord {
        name: partial.name,
        trader: partial.trader,
        required_location: partial.required_location,
        objective: partial.objective,
        reward: partial.reward,
        previous_quests: normalize_previous(links.previous, sentinel),
        next_quests: links.next,
    }
}

/// `previous` lists that open with the sentinel (`["N", "A"]`) mean "none".
pub fn normalize_previous(previous: Vec<String>, sentinel: &[String]) -> Vec<String> {
    if !sentinel.is_empty() && previous.starts_with(sentinel) {
        Vec::new()
    } else {
        previous
    }
}
