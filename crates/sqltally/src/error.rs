//! Error types for sqltally

use thiserror::Error;

/// Result type alias for sqltally operations
pub type TallyResult<T> = Result<T, TallyError>;

/// Error types for configuration loading.
///
/// Capturing and reporting themselves are infallible by design; the wrapped
/// call's own result is never replaced by a sqltally error.
#[derive(Debug, Error)]
pub enum TallyError {
    /// A configuration value could not be parsed
    #[error("Config error for {key}: {message}")]
    Config { key: String, message: String },

    /// The configuration file could not be read or parsed
    #[error("Config file error: {0}")]
    ConfigFile(String),
}

impl TallyError {
    /// Create a config error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a config file error
    pub fn config_file(message: impl Into<String>) -> Self {
        Self::ConfigFile(message.into())
    }
}
