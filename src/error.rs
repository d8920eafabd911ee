use thiserror::Error;

/// Errors that can occur when querying the search backend
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No indices matching pattern {0} found")]
    IndexNotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search backend returned error {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur when launching a command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to spawn command: {0}")]
    Spawn(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}
