use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One quest as written to the catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub name: String,
    pub trader: String,
    pub required_location: String,
    pub objective: Vec<String>,
    pub reward: Vec<String>,
    pub previous_quests: Vec<String>,
    pub next_quests: Vec<String>,
}

/// Write the whole catalog as pretty JSON. Goes through a temp file so an
/// interrupted write never leaves a truncated catalog behind.
pub fn write_catalog(path: &Path, records: &[QuestRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    let json = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {:?} to {:?}", tmp, path))?;
    Ok(())
}

pub fn read_catalog(path: &Path) -> Result<Vec<QuestRecord>> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&json).with_context(|| format!("{:?} is not a quest catalog", path))
}

pub struct CatalogStats {
    pub total: usize,
    pub unique_names: usize,
    pub traders: usize,
    pub with_previous: usize,
    pub with_next: usize,
    pub without_objective: usize,
    /// Link targets that name no quest in the catalog.
    pub dangling: BTreeSet<String>,
}

pub fn stats(records: &[QuestRecord]) -> CatalogStats {
    let names: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let traders: HashSet<&str> = records
        .iter()
        .map(|r| r.trader.as_str())
        .filter(|t| !t.is_empty())
        .collect();

    let dangling = records
        .iter()
        .flat_map(|r| r.previous_quests.iter().chain(&r.next_quests))
        .filter(|q| !names.contains(q.as_str()))
        .cloned()
        .collect();

    CatalogStats {
        total: records.len(),
        unique_names: names.len(),
        traders: traders.len(),
        with_previous: records.iter().filter(|r| !r.previous_quests.is_empty()).count(),
        with_next: records.iter().filter(|r| !r.next_quests.is_empty()).count(),
        without_objective: records.iter().filter(|r| r.objective.is_empty()).count(),
        dangling,
    }
}
