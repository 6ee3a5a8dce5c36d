use crate::analysis::losses::LossEntry;
use crate::analysis::ranking::{merge_rankings, TableKind};
use crate::config::TrackedConfig;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const RANKINGS_FILE: &str = "rankings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterRanking {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub solo: Vec<LossEntry>,
    /// Farmer losses older files kept per leek; folded into the shared
    /// table on load and never written back here.
    #[serde(default, rename = "farmer", skip_serializing)]
    pub legacy_farmer: Vec<LossEntry>,
}

/// Everything a run produces besides the cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rankings {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Keyed by tracked leek id.
    #[serde(default)]
    pub daltons: BTreeMap<String, CharacterRanking>,
    /// Shared farmer-vs-farmer table.
    #[serde(default)]
    pub farmer: Vec<LossEntry>,
    #[serde(default)]
    pub config: TrackedConfig,
}

impl Rankings {
    pub fn get_rankings_path(data_dir: &Path) -> PathBuf {
        data_dir.join(RANKINGS_FILE)
    }

    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        let path = Self::get_rankings_path(data_dir);

        match fs::read_to_string(&path) {
            Ok(content) => {
                let mut rankings: Rankings = serde_json::from_str(&content).map_err(|e| {
                    AppError::JsonError(format!("Failed to parse rankings: {}", e))
                })?;
                rankings.absorb_legacy_farmer_tables();
                Ok(rankings)
            }
            Err(_) => Ok(Rankings::default()),
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", data_dir.display(), e))
        })?;

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::JsonError(format!("Failed to serialize rankings: {}", e))
        })?;

        fs::write(Self::get_rankings_path(data_dir), json).map_err(|e| {
            AppError::IoError(format!("Failed to write rankings: {}", e))
        })
    }

    /// Moves per-leek farmer tables into the shared one, keeping the best
    /// entry per farmer. Rows already in the shared table win ties.
    fn absorb_legacy_farmer_tables(&mut self) {
        let mut combined = std::mem::take(&mut self.farmer);
        for (leek_id, ranking) in self.daltons.iter_mut() {
            if !ranking.legacy_farmer.is_empty() {
                log::info!(
                    "Moving {} farmer rows of leek {} into the shared table",
                    ranking.legacy_farmer.len(),
                    leek_id
                );
                combined.append(&mut ranking.legacy_farmer);
            }
        }
        self.farmer = merge_rankings(combined, Vec::new(), TableKind::Farmer);
    }

    pub fn merge_character(&mut self, leek_id: u64, name: &str, new_entries: Vec<LossEntry>) {
        let ranking = self.daltons.entry(leek_id.to_string()).or_default();
        ranking.name = name.to_string();
        let existing = std::mem::take(&mut ranking.solo);
        ranking.solo = merge_rankings(existing, new_entries, TableKind::Character);
    }

    pub fn merge_farmer(&mut self, new_entries: Vec<LossEntry>) {
        let existing = std::mem::take(&mut self.farmer);
        self.farmer = merge_rankings(existing, new_entries, TableKind::Farmer);
    }

    pub fn stamp(&mut self, config: &TrackedConfig) {
        self.last_updated = Some(Utc::now());
        self.config = config.clone();
    }
}
