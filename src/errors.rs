/*!
 * Error types for the reelsub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors surfaced by the subtitle compiler
///
/// Compilation either fully succeeds or fails with one of these before any
/// artifact is handed to the transcoder. Timing anomalies are repaired in place
/// and never show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Missing or malformed subtitle document, or an out-of-range style value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested font family has no resolvable file path
    #[error("Font not found: {family} ({reason})")]
    FontNotFound {
        /// Requested font family
        family: String,
        /// Why the lookup failed
        reason: String,
    },
}

impl CompileError {
    /// Shorthand for an `InvalidInput` error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The model answered, but not with a usable subtitle document
    #[error("Invalid subtitle payload: {0}")]
    InvalidPayload(#[from] CompileError),
}

impl ProviderError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::InvalidPayload(_) => true,
            Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors raised by the ffmpeg collaborator
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// ffmpeg could not be started
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(String),

    /// ffmpeg exited with a failure status
    #[error("ffmpeg exited with status {status}: {stderr}")]
    Failed {
        /// Exit code, -1 when killed by a signal
        status: i32,
        /// Filtered stderr output
        stderr: String,
    },

    /// ffmpeg ran longer than the configured timeout
    #[error("ffmpeg timed out after {0} seconds")]
    Timeout(u64),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the subtitle compiler
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the transcoder
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
