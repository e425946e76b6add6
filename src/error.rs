//! Error types for result-search

use thiserror::Error;

/// Result type alias for result-search operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for result-search
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid browse query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
