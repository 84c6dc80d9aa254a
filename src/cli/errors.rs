//! CLI-specific error types

use thiserror::Error;

use crate::schema::SchemaError;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CliError {
    /// Stable error code for the JSON error envelope
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "GC_CLI_CONFIG_ERROR",
            CliError::Io(_) => "GC_CLI_IO_ERROR",
            CliError::Json(_) => "GC_INVALID_JSON",
            CliError::Schema(e) => e.code().code(),
        }
    }

    /// Message without the code prefix
    pub fn message(&self) -> String {
        match self {
            CliError::Schema(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
