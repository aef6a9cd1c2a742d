//! Error types for the Sawt gateway

use thiserror::Error;

/// Result type alias for Sawt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Sawt gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech capture or synthesis error
    #[error("speech error: {0}")]
    Speech(String),

    /// ERP backend error
    #[error("erp error: {0}")]
    Erp(String),

    /// ERP authentication error
    #[error("auth error: {0}")]
    Auth(String),

    /// Text enhancement error
    #[error("enhancement error: {0}")]
    Enhance(String),

    /// Session store error
    #[error("session error: {0}")]
    Session(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
