use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_FILE: &str = "cache.json";

/// Fight ids already processed, per subject key (`leek_<id>` / `farmer_<id>`).
/// Entries only ever grow.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FightCache {
    entries: BTreeMap<String, BTreeSet<u64>>,
}

impl FightCache {
    pub fn new() -> Self {
        FightCache::default()
    }

    pub fn get_cache_path(data_dir: &Path) -> PathBuf {
        data_dir.join(CACHE_FILE)
    }

    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        let path = Self::get_cache_path(data_dir);

        match fs::read_to_string(&path) {
            Ok(content) => {
                let mut cache: FightCache = serde_json::from_str(&content).map_err(|e| {
                    AppError::JsonError(format!("Failed to parse cache: {}", e))
                })?;
                cache.migrate_bare_leek_keys();
                Ok(cache)
            }
            // Cache doesn't exist yet, start empty
            Err(_) => Ok(FightCache::new()),
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(data_dir).map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", data_dir.display(), e))
        })?;

        let json = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::JsonError(format!("Failed to serialize cache: {}", e))
        })?;

        fs::write(Self::get_cache_path(data_dir), json).map_err(|e| {
            AppError::IoError(format!("Failed to write cache: {}", e))
        })
    }

    pub fn contains(&self, key: &str, fight_id: u64) -> bool {
        self.entries
            .get(key)
            .map(|ids| ids.contains(&fight_id))
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub fn fight_ids(&self, key: &str) -> std::collections::HashSet<u64> {
        self.entries
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn add_fights(&mut self, key: &str, fight_ids: impl IntoIterator<Item = u64>) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .extend(fight_ids);
    }

    pub fn len(&self, key: &str) -> usize {
        self.entries.get(key).map(BTreeSet::len).unwrap_or(0)
    }

    /// Older caches were keyed by the bare leek id.
    fn migrate_bare_leek_keys(&mut self) {
        let bare: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !k.is_empty() && k.chars().all(|c| c.is_ascii_digit()))
            .cloned()
            .collect();

        for key in bare {
            if let Some(ids) = self.entries.remove(&key) {
                log::info!("Migrating cache key {} -> leek_{}", key, key);
                self.add_fights(&format!("leek_{}", key), ids);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "dalton-cache-{}-{}",
            label,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_file_loads_empty() {
        let cache = FightCache::load(&temp_dir("missing")).unwrap();
        assert_eq!(cache, FightCache::new());
    }

    #[test]
    fn add_is_a_union() {
        let mut cache = FightCache::new();
        cache.add_fights("leek_1", [3, 1]);
        cache.add_fights("leek_1", [1, 2]);

        assert_eq!(cache.len("leek_1"), 3);
        assert!(cache.contains("leek_1", 2));
        assert!(!cache.contains("farmer_1", 2));
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let dir = temp_dir("save");
        let mut cache = FightCache::new();
        cache.add_fights("leek_1", [10, 11]);
        cache.add_fights("farmer_7", [12]);
        cache.save(&dir).unwrap();

        let loaded = FightCache::load(&dir).unwrap();
        assert_eq!(loaded, cache);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn bare_leek_keys_are_migrated_on_load() {
        let dir = temp_dir("legacy");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            FightCache::get_cache_path(&dir),
            r#"{"101": [1, 2], "leek_101": [3], "farmer_7": [4]}"#,
        )
        .unwrap();

        let cache = FightCache::load(&dir).unwrap();
        assert_eq!(cache.fight_ids("leek_101"), [1, 2, 3].into_iter().collect());
        assert!(!cache.contains("101", 1));
        assert_eq!(cache.len("farmer_7"), 1);
        let _ = fs::remove_dir_all(dir);
    }
}
