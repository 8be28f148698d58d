//! Error types and handling infrastructure for logless.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library error type. The binary wraps it in `anyhow` for context.
//!
//! ## Error classes
//!
//! - **Fatal**: stream read failures, subprocess spawn/exit failures, a cache that
//!   cannot free enough headroom. These terminate the pager after the terminal is restored.
//! - **Recoverable**: bad user input (query too long, invalid pattern, unknown
//!   filter/direction key). These become a status message and the pager continues.
//!
//! Interrupted reads never reach this module; the stream layer retries them.

use std::process::ExitStatus;
use thiserror::Error;

/// The main error type for logless operations.
#[derive(Error, Debug)]
pub enum LoglessError {
    /// Reading the log stream or a subprocess pipe failed
    #[error("I/O operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The input stream contained a record that could not be framed
    #[error("Malformed log record: {message}")]
    MalformedRecord { message: String },

    /// A helper command (git show, git log) could not be started
    #[error("Failed to launch `{command}`")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A helper command ran but reported failure
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Eviction could not free enough memory for a commit body
    #[error("Cache exhausted: {requested} bytes requested with a limit of {limit} bytes")]
    CacheExhausted { requested: usize, limit: usize },

    /// The input stream did not contain a single commit
    #[error("No commits found in the log stream")]
    EmptyLog,

    /// Search pattern failed to compile
    #[error("Invalid search pattern: {message}")]
    InvalidPattern { message: String },

    /// Search query grew past the configured limit
    #[error("search query is too long! (limit: {limit} bytes)")]
    QueryTooLong { limit: usize },

    /// A keystroke that is not valid in the current prompt
    #[error("{prompt}: {key}")]
    InvalidKey { prompt: &'static str, key: char },

    /// UI and terminal related errors
    #[error("UI operation failed: {message}")]
    UIError { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid command line arguments
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// Standard Result type for logless operations.
pub type Result<T> = std::result::Result<T, LoglessError>;

impl LoglessError {
    /// Create an Io error from an io::Error with additional context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a MalformedRecord error with a descriptive message
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Create an InvalidPattern error with a descriptive message
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }

    /// Create a UIError with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Whether this error must terminate the pager.
    ///
    /// Recoverable errors are reported in the status line and leave the
    /// session in its default state.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidPattern { .. } | Self::QueryTooLong { .. } | Self::InvalidKey { .. }
        )
    }
}

impl From<std::io::Error> for LoglessError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::Io {
                message: "Unexpected end of stream".to_string(),
                source: err,
            },
            std::io::ErrorKind::BrokenPipe => Self::Io {
                message: "Pipe closed".to_string(),
                source: err,
            },
            _ => Self::Io {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let exhausted = LoglessError::CacheExhausted {
            requested: 64,
            limit: 32,
        };
        assert_eq!(
            exhausted.to_string(),
            "Cache exhausted: 64 bytes requested with a limit of 32 bytes"
        );

        let too_long = LoglessError::QueryTooLong { limit: 128 };
        assert_eq!(
            too_long.to_string(),
            "search query is too long! (limit: 128 bytes)"
        );

        let invalid = LoglessError::InvalidKey {
            prompt: "invalid direction specifier",
            key: 'x',
        };
        assert_eq!(invalid.to_string(), "invalid direction specifier: x");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LoglessError::EmptyLog.is_fatal());
        assert!(LoglessError::malformed("short record").is_fatal());
        assert!(LoglessError::CacheExhausted {
            requested: 1,
            limit: 0
        }
        .is_fatal());

        assert!(!LoglessError::pattern("unclosed group").is_fatal());
        assert!(!LoglessError::QueryTooLong { limit: 4 }.is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: LoglessError = io_err.into();

        match err {
            LoglessError::Io { message, .. } => assert_eq!(message, "Pipe closed"),
            _ => panic!("Expected Io variant"),
        }
    }
}
