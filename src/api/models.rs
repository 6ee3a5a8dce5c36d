use serde::Deserialize;
use serde_json::{Map, Value};

// farmer/login-token response
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub farmer: Option<FarmerDto>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FarmerDto {
    pub id: u64,
    #[serde(default)]
    pub login: String,
}

// history/get-leek-history and history/get-farmer-history responses
#[derive(Debug, Deserialize, Default)]
pub struct HistoryResponse {
    #[serde(default)]
    pub fights: Vec<FightSummary>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FightSummary {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: i64,
}

/// Winner code of a finished fight.
pub const WINNER_SIDE_1: i64 = 1;
pub const WINNER_SIDE_2: i64 = 2;

/// Action code whose payload is the turn number that is starting.
pub const ACTION_NEW_TURN: i64 = 6;

// fight/get response. Every field is optional so a partial record still
// deserializes; the extractor substitutes defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FightRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default = "pending_winner")]
    pub winner: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub leeks1: Vec<LeekDto>,
    #[serde(default)]
    pub leeks2: Vec<LeekDto>,
    #[serde(default)]
    pub farmers1: Value,
    #[serde(default)]
    pub farmers2: Value,
    // Older record shape: id lists plus a shared descriptor map.
    #[serde(default)]
    pub team1: Vec<Value>,
    #[serde(default)]
    pub team2: Vec<Value>,
    #[serde(default)]
    pub leeks: Value,
    #[serde(default)]
    pub data: Option<FightData>,
    #[serde(default)]
    pub actions: Vec<Value>,
}

fn pending_winner() -> i64 {
    -1
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FightData {
    #[serde(default)]
    pub actions: Vec<Value>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LeekDto {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: u32,
    #[serde(default, alias = "owner")]
    pub farmer: Option<u64>,
    #[serde(default, alias = "owner_name")]
    pub farmer_name: Option<String>,
}

impl FightRecord {
    /// Participants of side 1 or 2, whichever shape the record uses.
    pub fn roster(&self, side: i64) -> Vec<LeekDto> {
        let (leeks, team) = if side == WINNER_SIDE_1 {
            (&self.leeks1, &self.team1)
        } else {
            (&self.leeks2, &self.team2)
        };

        if !leeks.is_empty() {
            return leeks.clone();
        }

        team.iter()
            .filter_map(id_of)
            .filter_map(|id| {
                let leek = self.leeks.get(id.to_string())?;
                let leek: LeekDto = serde_json::from_value(leek.clone()).ok()?;
                Some(LeekDto { id, ..leek })
            })
            .collect()
    }

    /// Side-level farmer map, if the record carries one as an object.
    pub fn side_farmers(&self, side: i64) -> Option<&Map<String, Value>> {
        if side == WINNER_SIDE_1 {
            self.farmers1.as_object()
        } else {
            self.farmers2.as_object()
        }
    }

    pub fn actions(&self) -> &[Value] {
        match &self.data {
            Some(data) if !data.actions.is_empty() => &data.actions,
            _ => &self.actions,
        }
    }
}

/// Ids show up both as numbers and as numeric strings.
fn id_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
