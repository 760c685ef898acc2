//! Render error definitions

use thiserror::Error;

/// Render-specific error type
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template: {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template: failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("template: {name}:{line}: executing: {message}")]
    Exec {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template and template path are both specified for \"{subject}\"")]
    Conflict { subject: String },

    #[error("template \"{subject}\" has neither an inline body nor a path")]
    Empty { subject: String },

    #[error("render data could not be serialized: {0}")]
    Data(#[from] serde_json::Error),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
