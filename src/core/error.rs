//! Library-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Discovery feed error: {0}")]
    Discovery(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Resolution task failed: {0}")]
    Task(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<fantoccini::error::CmdError> for AppError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        AppError::WebDriver(e.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for AppError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        AppError::WebDriver(format!("failed to open session: {}", e))
    }
}
