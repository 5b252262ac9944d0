//! Error handling for profile probing operations.
//!
//! This module defines a single error type that covers every way a probe can
//! fail, from network issues to responses a predicate cannot interpret, plus
//! the configuration and input errors raised around the engine.

use std::fmt;
use std::time::Duration;

/// Main error type for profile probing operations.
///
/// Probe-level variants (`Network`, `Timeout`, `Validation`, `RequestBuild`,
/// `Extraction`) never abort a run: the executor folds them into the
/// affected probe's [`Outcome`](crate::Outcome). The remaining variants are
/// raised by configuration loading and input validation.
#[derive(Debug, Clone)]
pub enum ProbeError {
    /// Connection, DNS, TLS or other transport-level failures
    Network {
        message: String,
        source: Option<String>,
    },

    /// The request did not complete within the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The predicate could not interpret the response
    Validation { platform: String, message: String },

    /// The resolved URL could not be turned into a request
    RequestBuild { url: String, message: String },

    /// A profile extractor failed (never surfaced on an outcome)
    Extraction { platform: String, message: String },

    /// Username rejected before any probe was dispatched
    InvalidUsername { username: String, reason: String },

    /// A platform name that is not in the catalog
    UnknownPlatform { name: String },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading configuration files
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl ProbeError {
    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new validation error.
    pub fn validation<P: Into<String>, M: Into<String>>(platform: P, message: M) -> Self {
        Self::Validation {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Create a new request construction error.
    pub fn request_build<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::RequestBuild {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new extraction error.
    pub fn extraction<P: Into<String>, M: Into<String>>(platform: P, message: M) -> Self {
        Self::Extraction {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid username error.
    pub fn invalid_username<U: Into<String>, R: Into<String>>(username: U, reason: R) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unknown platform error.
    pub fn unknown_platform<N: Into<String>>(name: N) -> Self {
        Self::UnknownPlatform { name: name.into() }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error suggests the attempt should be retried.
    ///
    /// Request construction errors are listed here too: they still consume
    /// an attempt, even though the resolved URL will not change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Timeout { .. }
                | Self::Validation { .. }
                | Self::RequestBuild { .. }
        )
    }

    /// Check if a backoff sleep should precede the next attempt.
    ///
    /// Only transport failures back off; validation and request errors
    /// move straight on to the next attempt.
    pub fn applies_backoff(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Validation { platform, message } => {
                write!(f, "Validation error for '{}': {}", platform, message)
            }
            Self::RequestBuild { url, message } => {
                write!(f, "Failed to build request for '{}': {}", url, message)
            }
            Self::Extraction { platform, message } => {
                write!(f, "Extraction error for '{}': {}", platform, message)
            }
            Self::InvalidUsername { username, reason } => {
                write!(f, "Invalid username '{}': {}", username, reason)
            }
            Self::UnknownPlatform { name } => {
                write!(f, "Unknown platform '{}'", name)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_builder() {
            Self::network_with_source("Failed to build HTTP client", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
