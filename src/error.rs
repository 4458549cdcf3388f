//! Custom error types for lectern

use thiserror::Error;

/// Message shown when the API cannot be reached at all
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Message used when an error response carries no usable text
pub const DEFAULT_API_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

/// Main error type for lectern operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not authenticated: run 'lectern login' first")]
    Unauthorized,

    #[error("{0}")]
    Network(String),

    #[error("Validation failed:\n{0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("No workspace found. Please create a workspace first.")]
    NoWorkspace,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status carried by the error, 0 for transport failures
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Unauthorized => Some(401),
            Error::Network(_) => Some(0),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }
}

/// Result type alias for lectern
pub type Result<T> = std::result::Result<T, Error>;
