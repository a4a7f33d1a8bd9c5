use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(validades::auth),
        help("Run `get_calendar_token` to authorize the calendar account again")
    )]
    Auth(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(validades::google_calendar))]
    GoogleCalendar(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(validades::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(validades::config))]
    Config(String),

    #[error("Worksheet error: {0}")]
    #[diagnostic(code(validades::sheet))]
    Sheet(String),

    #[error("{0}")]
    #[diagnostic(code(validades::validation))]
    Validation(String),

    #[error(transparent)]
    #[diagnostic(code(validades::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(validades::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(validades::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create worksheet errors
pub fn sheet_error(message: &str) -> Error {
    Error::Sheet(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}
