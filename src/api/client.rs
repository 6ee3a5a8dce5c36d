use crate::config::Config;
use crate::error::AppError;
use crate::history::{FightSource, TrackedSubject};
use crate::rate_limit::{RequestExecutor, UreqTransport};
use serde::de::DeserializeOwned;

use super::endpoints;
use super::models::*;

pub struct LeekWarsClient {
    executor: RequestExecutor<UreqTransport>,
}

impl LeekWarsClient {
    pub fn new(config: &Config) -> Self {
        LeekWarsClient {
            executor: RequestExecutor::new(
                UreqTransport::new(),
                &config.base_url,
                config.retry.clone(),
            ),
        }
    }

    /// Exchanges credentials for a bearer token, kept for the rest of the run.
    pub fn login(&mut self, login: &str, password: &str) -> Result<FarmerDto, AppError> {
        let url = format!("{}/{}", self.executor.base_url(), endpoints::LOGIN);

        let response = self
            .executor
            .transport()
            .agent()
            .post(&url)
            .send_form(&[("login", login), ("password", password)]);

        let body = match response {
            Ok(resp) => resp.into_string(),
            // Rejected logins still carry a JSON body with an `error` field
            Err(ureq::Error::Status(_, resp)) => resp.into_string(),
            Err(e) => return Err(AppError::AuthFailed(e.to_string())),
        }
        .map_err(|e| AppError::AuthFailed(e.to_string()))?;

        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::AuthFailed(format!("unreadable login response: {}", e)))?;

        match (parsed.token, parsed.farmer) {
            (Some(token), Some(farmer)) => {
                self.executor.transport_mut().set_bearer(token);
                Ok(farmer)
            }
            (_, _) => Err(AppError::AuthFailed(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        let value = self.executor.execute(endpoint)?;
        serde_json::from_value(value).map_err(|e| {
            AppError::JsonError(format!("{}: {}", endpoint, e))
        })
    }

    pub fn get_leek_history(&self, leek_id: u64) -> Result<HistoryResponse, AppError> {
        self.get(&endpoints::leek_history(leek_id))
    }

    pub fn get_farmer_history(&self, farmer_id: u64) -> Result<HistoryResponse, AppError> {
        self.get(&endpoints::farmer_history(farmer_id))
    }

    pub fn get_fight(&self, fight_id: u64) -> Result<FightRecord, AppError> {
        self.get(&endpoints::fight(fight_id))
    }
}

impl FightSource for LeekWarsClient {
    fn history(&self, subject: &TrackedSubject) -> Result<Vec<FightSummary>, AppError> {
        let response = match subject {
            TrackedSubject::Leek { id, .. } => self.get_leek_history(*id)?,
            TrackedSubject::Farmer { id, .. } => self.get_farmer_history(*id)?,
        };
        Ok(response.fights)
    }

    fn fight(&self, fight_id: u64) -> Result<FightRecord, AppError> {
        self.get_fight(fight_id)
    }
}
