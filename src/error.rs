//! Error types for Talvi
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Talvi operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, provider interactions, authentication,
/// attachment encoding, and history storage.
#[derive(Error, Debug)]
pub enum TalviError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (generation API calls, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Speech synthesis or audio decoding errors
    #[error("Speech error: {0}")]
    Speech(String),

    /// Attachment encoding errors (unreadable file, invalid encoding)
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Both the prompt and the attachment are empty
    #[error("Empty input: prompt is blank and no attachment is present")]
    EmptyInput,

    /// No message with the requested id exists in the history log
    #[error("Message not found in history: {0}")]
    MessageNotFound(String),

    /// Authentication errors (rejected credentials, expired session)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Missing stored credentials for the identity provider
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Speech synthesis not supported by provider
    #[error("Speech synthesis is not supported by this provider")]
    SpeechNotSupported,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// History storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type alias for Talvi operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
