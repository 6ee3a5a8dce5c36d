use super::losses::{FightCategory, LossEntry};
use std::collections::HashMap;

/// Separator of the abandoned `<farmer>_<leek>` key scheme.
const LEGACY_KEY_SEPARATOR: char = '_';
const UNKNOWN_FARMER_KEY: &str = "unknown";

/// Which table an entry is merged into decides what it admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Per tracked leek: solo losses against exactly one opponent leek.
    Character,
    /// Shared across the tracked farmer: farmer-vs-farmer losses.
    Farmer,
}

impl TableKind {
    fn admits(&self, entry: &LossEntry) -> bool {
        match self {
            TableKind::Character => {
                entry.fight_type == FightCategory::Solo && entry.leeks.len() == 1
            }
            TableKind::Farmer => entry.fight_type == FightCategory::Farmer,
        }
    }
}

pub fn merge_key(entry: &LossEntry) -> String {
    entry
        .farmer_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| UNKNOWN_FARMER_KEY.to_string())
}

/// Rewrites composite `<farmer>_<leek>` keys to the farmer-only form.
/// Returns how many keys were rewritten.
pub fn migrate_legacy_keys(table: &mut [LossEntry]) -> usize {
    let mut migrated = 0;
    for entry in table.iter_mut() {
        if entry.key.contains(LEGACY_KEY_SEPARATOR) {
            let new_key = match entry.farmer_id {
                Some(id) => id.to_string(),
                // Farmer-less rows were saved as `None_<leek>`
                None => entry
                    .key
                    .split(LEGACY_KEY_SEPARATOR)
                    .next()
                    .and_then(|prefix| prefix.parse::<u64>().ok())
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| UNKNOWN_FARMER_KEY.to_string()),
            };
            log::info!("Migrating ranking key {} -> {}", entry.key, new_key);
            entry.key = new_key;
            migrated += 1;
        } else if entry.key.is_empty() {
            entry.key = merge_key(entry);
        }
    }
    migrated
}

/// Keeps `candidate` only if it is strictly better than what the key holds,
/// so the first of two equal entries stays.
fn offer(best: &mut HashMap<String, LossEntry>, candidate: LossEntry) {
    match best.get(&candidate.key) {
        Some(current) if current.ranking_key() <= candidate.ranking_key() => {}
        _ => {
            best.insert(candidate.key.clone(), candidate);
        }
    }
}

/// Folds `new_entries` into `existing`, one best entry per opposing farmer,
/// sorted by ascending (total level, turns).
pub fn merge_rankings(
    existing: Vec<LossEntry>,
    new_entries: Vec<LossEntry>,
    kind: TableKind,
) -> Vec<LossEntry> {
    let mut existing = existing;
    migrate_legacy_keys(&mut existing);

    let mut best: HashMap<String, LossEntry> = HashMap::new();
    for entry in existing {
        offer(&mut best, entry);
    }

    for mut entry in new_entries {
        if !kind.admits(&entry) {
            continue;
        }
        entry.key = merge_key(&entry);
        offer(&mut best, entry);
    }

    let mut table: Vec<LossEntry> = best.into_values().collect();
    table.sort_by(|a, b| {
        a.ranking_key()
            .cmp(&b.ranking_key())
            .then_with(|| a.key.cmp(&b.key))
    });
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::losses::OpponentLeek;

    fn entry(fight_id: u64, farmer_id: u64, total_level: u32, turns: u32) -> LossEntry {
        LossEntry {
            key: String::new(),
            fight_id,
            fight_type: FightCategory::Solo,
            farmer_id: Some(farmer_id),
            farmer_name: format!("farmer{}", farmer_id),
            leeks: vec![OpponentLeek {
                id: fight_id + 10_000,
                name: "Foo".to_string(),
                level: total_level,
            }],
            total_level,
            turns,
            date: 0,
        }
    }

    fn farmer_entry(fight_id: u64, farmer_id: u64, total_level: u32, turns: u32) -> LossEntry {
        LossEntry {
            fight_type: FightCategory::Farmer,
            ..entry(fight_id, farmer_id, total_level, turns)
        }
    }

    #[test]
    fn first_loss_creates_farmer_keyed_row() {
        let table = merge_rankings(Vec::new(), vec![entry(1, 42, 80, 4)], TableKind::Character);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].key, "42");
        assert_eq!(table[0].ranking_key(), (80, 4));
    }

    #[test]
    fn lower_level_wins_regardless_of_turns() {
        let table = merge_rankings(
            Vec::new(),
            vec![entry(1, 42, 80, 4), entry(2, 42, 60, 10)],
            TableKind::Character,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].fight_id, 2);
    }

    #[test]
    fn equal_level_prefers_fewer_turns() {
        let table = merge_rankings(
            Vec::new(),
            vec![entry(1, 42, 80, 4), entry(2, 42, 80, 2)],
            TableKind::Character,
        );
        assert_eq!(table[0].turns, 2);
    }

    #[test]
    fn full_tie_keeps_first_seen() {
        let existing = merge_rankings(Vec::new(), vec![entry(1, 42, 80, 4)], TableKind::Character);
        let table = merge_rankings(existing, vec![entry(2, 42, 80, 4)], TableKind::Character);
        assert_eq!(table[0].fight_id, 1);
    }

    #[test]
    fn merging_nothing_is_idempotent() {
        let table = merge_rankings(
            Vec::new(),
            vec![entry(1, 42, 80, 4), entry(2, 7, 30, 9), entry(3, 9, 30, 2)],
            TableKind::Character,
        );
        assert_eq!(merge_rankings(table.clone(), Vec::new(), TableKind::Character), table);
        assert_eq!(
            table.iter().map(|e| e.fight_id).collect::<Vec<_>>(),
            vec![3, 2, 1]
        );
    }

    #[test]
    fn order_of_new_entries_does_not_change_winners() {
        let entries = vec![
            entry(1, 42, 80, 4),
            entry(2, 42, 60, 10),
            entry(3, 42, 60, 12),
            entry(4, 7, 90, 1),
            entry(5, 7, 90, 3),
        ];
        let forward = merge_rankings(Vec::new(), entries.clone(), TableKind::Character);
        let mut reversed_input = entries;
        reversed_input.reverse();
        let reversed = merge_rankings(Vec::new(), reversed_input, TableKind::Character);

        assert_eq!(forward, reversed);
    }

    #[test]
    fn worse_entry_never_replaces_recorded_best() {
        let existing = merge_rankings(Vec::new(), vec![entry(1, 42, 60, 3)], TableKind::Character);
        let table = merge_rankings(existing, vec![entry(2, 42, 61, 1)], TableKind::Character);
        assert_eq!(table[0].fight_id, 1);
    }

    #[test]
    fn legacy_composite_keys_collapse_to_farmer_key() {
        let mut old_a = entry(1, 42, 90, 5);
        old_a.key = "42_5001".to_string();
        let mut old_b = entry(2, 42, 70, 8);
        old_b.key = "42_5002".to_string();

        let table = merge_rankings(
            vec![old_a, old_b],
            vec![entry(3, 42, 75, 1)],
            TableKind::Character,
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table[0].key, "42");
        assert_eq!(table[0].fight_id, 2);
        assert!(table.iter().all(|e| !e.key.contains('_')));
    }

    #[test]
    fn legacy_key_without_farmer_id_uses_prefix() {
        let mut old = entry(1, 0, 90, 5);
        old.farmer_id = None;
        old.key = "13_77".to_string();
        let mut table = vec![old];

        assert_eq!(migrate_legacy_keys(&mut table), 1);
        assert_eq!(table[0].key, "13");
    }

    #[test]
    fn farmerless_legacy_row_shares_key_with_new_farmerless_loss() {
        let mut old = entry(1, 0, 90, 5);
        old.farmer_id = None;
        old.key = "None_5".to_string();
        let mut fresh = entry(2, 0, 40, 3);
        fresh.farmer_id = None;

        let table = merge_rankings(vec![old], vec![fresh], TableKind::Character);

        assert_eq!(table.len(), 1);
        assert_eq!(table[0].key, "unknown");
        assert_eq!(table[0].fight_id, 2);
    }

    #[test]
    fn character_table_admits_only_one_on_one_solo() {
        let mut two_leeks = entry(1, 42, 80, 4);
        two_leeks.leeks.push(OpponentLeek { id: 9, name: "Bar".to_string(), level: 1 });

        let table = merge_rankings(
            Vec::new(),
            vec![two_leeks, farmer_entry(2, 43, 10, 1), entry(3, 44, 50, 5)],
            TableKind::Character,
        );
        assert_eq!(table.iter().map(|e| e.fight_id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn farmer_table_admits_only_farmer_fights() {
        let mut team = farmer_entry(3, 45, 5, 5);
        team.fight_type = FightCategory::Team;

        let table = merge_rankings(
            Vec::new(),
            vec![entry(1, 42, 80, 4), farmer_entry(2, 43, 150, 7), team],
            TableKind::Farmer,
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].key, "43");
    }
}
