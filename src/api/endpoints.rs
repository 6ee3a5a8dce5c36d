// Endpoint paths relative to the API base URL.

pub const LOGIN: &str = "farmer/login-token";

pub fn leek_history(leek_id: u64) -> String {
    format!("history/get-leek-history/{}", leek_id)
}

pub fn farmer_history(farmer_id: u64) -> String {
    format!("history/get-farmer-history/{}", farmer_id)
}

pub fn fight(fight_id: u64) -> String {
    format!("fight/get/{}", fight_id)
}
