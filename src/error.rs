use std::io;
use thiserror::Error;

/// Errors raised while reading emitter configuration.
///
/// Only unreadable input is an error. Malformed values inside a valid
/// configuration object degrade to identity behavior and are logged instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration text is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration is valid JSON but not an object
    #[error("emitter configuration must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Result type using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Name of a JSON value's kind, used in error messages and warnings
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
