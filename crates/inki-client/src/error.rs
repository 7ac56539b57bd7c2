//! Error types for the Inki client

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur talking to an Inki server
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request envelope could not be built
    #[error("Failed to build signed request: {0}")]
    Envelope(String),

    /// Signing a payload failed
    #[error("Failed to sign request: {0}")]
    Signing(#[from] inki_core::InkiError),

    /// Server address is not a usable base URL
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),

    /// `user@host` target could not be parsed
    #[error("Invalid target '{0}': expected user@host[:port]")]
    InvalidTarget(String),

    /// Agent configuration could not be loaded
    #[error("Invalid agent config: {0}")]
    Config(String),

    /// A pre-flight check command failed
    #[error("Check '{command}' failed{}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    CheckFailed { command: String, code: Option<i32> },
}
