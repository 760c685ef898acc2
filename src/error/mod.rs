use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Short machine-readable code for structured logs
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io { .. } => "IO_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
