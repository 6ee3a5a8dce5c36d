use crate::api::models::{FightRecord, LeekDto, ACTION_NEW_TURN, WINNER_SIDE_1, WINNER_SIDE_2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

const UNKNOWN_NAME: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FightCategory {
    Solo,
    Farmer,
    Team,
    Other,
}

impl FightCategory {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => FightCategory::Solo,
            1 => FightCategory::Farmer,
            2 => FightCategory::Team,
            _ => FightCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FightCategory::Solo => "solo",
            FightCategory::Farmer => "farmer",
            FightCategory::Team => "team",
            FightCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentLeek {
    pub id: u64,
    pub name: String,
    pub level: u32,
}

/// One fight a tracked leek lost, described from the winner's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossEntry {
    /// Merge key, assigned when the entry enters a ranking table.
    #[serde(default)]
    pub key: String,
    pub fight_id: u64,
    pub fight_type: FightCategory,
    #[serde(default)]
    pub farmer_id: Option<u64>,
    #[serde(default = "unknown_name")]
    pub farmer_name: String,
    #[serde(default)]
    pub leeks: Vec<OpponentLeek>,
    #[serde(default)]
    pub total_level: u32,
    #[serde(default)]
    pub turns: u32,
    #[serde(default)]
    pub date: i64,
}

fn unknown_name() -> String {
    UNKNOWN_NAME.to_string()
}

impl LossEntry {
    /// Lower is better: weaker opposition first, then shorter fights.
    pub fn ranking_key(&self) -> (u32, u32) {
        (self.total_level, self.turns)
    }

    pub fn leek_names(&self) -> String {
        self.leeks
            .iter()
            .map(|l| format!("{} (L{})", l.name, l.level))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Returns the opposing side's description if a tracked leek's side lost
/// `fight`; `None` for draws, pending fights, wins and unrelated fights.
pub fn extract_loss(fight: &FightRecord, tracked_ids: &HashSet<u64>) -> Option<LossEntry> {
    if fight.winner != WINNER_SIDE_1 && fight.winner != WINNER_SIDE_2 {
        return None;
    }

    let tracked_side = [WINNER_SIDE_1, WINNER_SIDE_2]
        .into_iter()
        .find(|&side| fight.roster(side).iter().any(|l| tracked_ids.contains(&l.id)))?;

    if tracked_side == fight.winner {
        return None;
    }

    let opposing_side = fight.winner;
    let roster = fight.roster(opposing_side);
    if roster.is_empty() {
        return None;
    }

    let (farmer_id, farmer_name) = opposing_farmer(&roster, fight.side_farmers(opposing_side));

    let leeks: Vec<OpponentLeek> = roster
        .iter()
        .map(|l| OpponentLeek {
            id: l.id,
            name: l.name.clone().unwrap_or_else(unknown_name),
            level: l.level,
        })
        .collect();

    Some(LossEntry {
        key: String::new(),
        fight_id: fight.id,
        fight_type: FightCategory::from_code(fight.kind),
        farmer_id,
        farmer_name,
        total_level: leeks.iter().map(|l| l.level).sum(),
        leeks,
        turns: count_turns(fight.actions()),
        date: fight.date,
    })
}

/// Farmer fields on a participant win; the side-level farmer map's first
/// entry is only used when no participant carries any.
fn opposing_farmer(
    roster: &[LeekDto],
    side_farmers: Option<&Map<String, Value>>,
) -> (Option<u64>, String) {
    let direct = roster
        .iter()
        .find(|l| l.farmer.is_some() || l.farmer_name.is_some());

    let (farmer_id, farmer_name) = match direct {
        Some(leek) => {
            let name = leek.farmer_name.clone().or_else(|| {
                let id = leek.farmer?;
                side_farmers?
                    .iter()
                    .find(|(key, value)| map_farmer_id(key, value) == Some(id))
                    .and_then(|(_, value)| map_farmer_name(value))
            });
            (leek.farmer, name)
        }
        None => match side_farmers.and_then(|farmers| farmers.iter().next()) {
            Some((key, value)) => (map_farmer_id(key, value), map_farmer_name(value)),
            None => (None, None),
        },
    };

    (farmer_id, farmer_name.unwrap_or_else(unknown_name))
}

fn map_farmer_id(key: &str, value: &Value) -> Option<u64> {
    value
        .get("id")
        .and_then(Value::as_u64)
        .or_else(|| key.parse().ok())
}

fn map_farmer_name(value: &Value) -> Option<String> {
    value
        .get("name")
        .or_else(|| value.get("login"))
        .and_then(Value::as_str)
        .or_else(|| value.as_str())
        .map(str::to_string)
}

/// Payload of the last turn-marker action, 0 when there is none.
pub fn count_turns(actions: &[Value]) -> u32 {
    actions
        .iter()
        .filter_map(Value::as_array)
        .filter(|action| action.len() >= 2 && action[0].as_i64() == Some(ACTION_NEW_TURN))
        .filter_map(|action| action[1].as_u64())
        .last()
        .map(|turn| turn as u32)
        .unwrap_or(0)
}
