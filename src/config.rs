use crate::error::AppError;
use crate::rate_limit::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://leekwars.com/api";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const DEFAULT_BACKOFF_BASE_SECS: u64 = 5;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub login: String,
    pub password: String,
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let login = env::var("LEEKWARS_LOGIN").map_err(|_| {
            AppError::ConfigError("LEEKWARS_LOGIN not set (env or .env file)".to_string())
        })?;
        let password = env::var("LEEKWARS_PASSWORD").map_err(|_| {
            AppError::ConfigError("LEEKWARS_PASSWORD not set (env or .env file)".to_string())
        })?;

        let base_url = env::var("LEEKWARS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let retry = RetryPolicy {
            request_delay: Duration::from_millis(env_number(
                "LEEKWARS_REQUEST_DELAY_MS",
                DEFAULT_REQUEST_DELAY_MS,
            )?),
            backoff_base: Duration::from_secs(env_number(
                "LEEKWARS_BACKOFF_BASE_SECS",
                DEFAULT_BACKOFF_BASE_SECS,
            )?),
            max_attempts: max_attempts(env_number(
                "LEEKWARS_MAX_ATTEMPTS",
                DEFAULT_MAX_ATTEMPTS as u64,
            )?)?,
        };

        Ok(Config {
            login,
            password,
            base_url,
            retry,
        })
    }
}

fn env_number(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| {
                AppError::ConfigError(format!("{} must be a number, got {:?}", name, raw))
            }),
        Err(_) => Ok(default),
    }
}

fn max_attempts(raw: u64) -> Result<u32, AppError> {
    match u32::try_from(raw) {
        Ok(0) => Err(AppError::ConfigError(
            "LEEKWARS_MAX_ATTEMPTS must be at least 1".to_string(),
        )),
        Ok(attempts) => Ok(attempts),
        Err(_) => Err(AppError::ConfigError(format!(
            "LEEKWARS_MAX_ATTEMPTS is too large: {}",
            raw
        ))),
    }
}

/// A character whose losses are tracked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedLeek {
    pub leek_id: u64,
    pub name: String,
}

/// The account owning the tracked characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedFarmer {
    pub farmer_id: u64,
    pub name: String,
}

/// Contents of the tracked-subjects file. Echoed into the rankings output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TrackedConfig {
    #[serde(default)]
    pub daltons: Vec<TrackedLeek>,
    #[serde(default)]
    pub farmer: Option<TrackedFarmer>,
}

impl TrackedConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        serde_json::from_str(content)
            .map_err(|e| AppError::ConfigError(format!("Invalid tracked config: {}", e)))
    }

    /// Characters with a real identifier; `0` is a placeholder.
    pub fn active_leeks(&self) -> impl Iterator<Item = &TrackedLeek> {
        self.daltons.iter().filter(|d| d.leek_id != 0)
    }

    pub fn placeholder_leeks(&self) -> impl Iterator<Item = &TrackedLeek> {
        self.daltons.iter().filter(|d| d.leek_id == 0)
    }

    pub fn tracked_ids(&self) -> Vec<u64> {
        self.active_leeks().map(|d| d.leek_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daltons_and_optional_farmer() {
        let cfg = TrackedConfig::parse(
            r#"{
                "daltons": [
                    {"leek_id": 101, "name": "Joe"},
                    {"leek_id": 0, "name": "Averell"}
                ],
                "farmer": {"farmer_id": 7, "name": "Ma Dalton"}
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.tracked_ids(), vec![101]);
        assert_eq!(cfg.placeholder_leeks().count(), 1);
        assert_eq!(cfg.farmer.unwrap().farmer_id, 7);
    }

    #[test]
    fn farmer_is_optional() {
        let cfg = TrackedConfig::parse(r#"{"daltons": [{"leek_id": 3, "name": "Jack"}]}"#).unwrap();
        assert!(cfg.farmer.is_none());
    }

    #[test]
    fn max_attempts_must_fit_and_be_positive() {
        assert_eq!(max_attempts(3).unwrap(), 3);
        assert!(matches!(max_attempts(0), Err(AppError::ConfigError(_))));
        assert!(matches!(max_attempts(4_294_967_296), Err(AppError::ConfigError(_))));
        assert!(matches!(max_attempts(u64::MAX), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn rejects_malformed_file() {
        assert!(matches!(
            TrackedConfig::parse("{\"daltons\": 5}"),
            Err(AppError::ConfigError(_))
        ));
    }
}
