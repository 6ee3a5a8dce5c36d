use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Login failed: {0}")]
    AuthFailed(String),

    #[error("Rate limited on every attempt ({attempts} tries), giving up")]
    RateLimited { attempts: u32 },

    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { status: u16, endpoint: String },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}
