use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::parser::table::{Column, TableLayout};

const DEFAULT_FILE: &str = "quests";
const ENV_PREFIX: &str = "QUESTS";

/// Run settings. Layers, lowest first: defaults, `quests.toml` (or the file
/// given on the command line), `QUESTS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub index_title: String,
    /// Class tokens a quest table must carry.
    pub table_class: String,
    pub infobox_template: String,
    pub columns: Vec<Column>,
    /// Parsed `previous` list that means "none".
    pub sentinel: Vec<String>,
    pub output: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Parallel quest-page fetches; 1 keeps the run sequential.
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "https://arcraiders.wiki".into(),
            index_title: "Quests".into(),
            table_class: "sortable wikitable".into(),
            infobox_template: "Infobox_quest".into(),
            columns: TableLayout::default().columns().to_vec(),
            sentinel: vec!["N".into(), "A".into()],
            output: PathBuf::from("data/quest_database.json"),
            user_agent: concat!("quest_catalog/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 30,
            workers: 1,
        }
    }
}

pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_FILE).required(false),
    };

    let settings: Settings = Config::builder()
        .add_source(file)
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")?;

    Ok(Settings {
        workers: settings.workers.max(1),
        ..settings
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let s = load(None).unwrap();
        assert_eq!(s.index_title, "Quests");
        assert_eq!(s.columns.len(), 5);
        assert_eq!(s.sentinel, vec!["N", "A"]);
        assert!(s.workers >= 1);
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("quests_cfg_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "index_title = \"Side Quests\"\nworkers = 0\ncolumns = [\"skip\", \"name\", \"required_location\"]\nsentinel = [\"None\"]\n",
        )
        .unwrap();
        let s = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(s.index_title, "Side Quests");
        assert_eq!(s.workers, 1);
        assert_eq!(s.columns, vec![Column::Skip, Column::Name, Column::Location]);
        assert_eq!(s.sentinel, vec!["None"]);
        assert_eq!(s.table_class, "sortable wikitable");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/quests.toml"))).is_err());
    }
}
