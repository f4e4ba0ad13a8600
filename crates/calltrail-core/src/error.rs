//! Error types for the ambient layer
//!
//! Trace operations themselves never fail: parse problems leave fields unset
//! and appends to a locked trace are no-ops. This error type covers the
//! surrounding infrastructure (logging setup) and rejected deserialized traces.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Logging Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Log directory could not be created: {path}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Logging error: {message}")]
    Logging { message: String },

    // ─────────────────────────────────────────────────────────────
    // Trace Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Stack trace has no frames")]
    EmptyTrace,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn log_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogDirectory {
            path: path.into(),
            source,
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_messages() {
        let err = Error::logging("subscriber already set");
        assert_eq!(err.to_string(), "Logging error: subscriber already set");

        assert_eq!(Error::EmptyTrace.to_string(), "Stack trace has no frames");
    }

    #[test]
    fn test_log_directory_keeps_io_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::log_directory("/nope/logs", io_err);
        assert!(err.to_string().contains("/nope/logs"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("denied"));
    }
}
