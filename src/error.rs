//! Unified error types for Sieve with fail-open philosophy.
//!
//! The search engine itself raises no domain errors: empty or degenerate
//! queries simply produce no results. Errors only arise at the edges, when
//! the record source is unreachable, a corpus file is malformed, or a
//! caller routes a record to a category that was never registered. Callers
//! that must not be blocked by those failures use [`FailOpen`] to log a
//! warning and continue with a safe default.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Sieve operations.
#[derive(Error, Debug)]
pub enum SieveError {
    /// I/O errors from corpus or config file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A corpus file exceeds the in-memory size limit.
    #[error("file {} is too large ({size} bytes, max {max} bytes)", path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    /// The record source could not supply the corpus.
    #[error("record source error: {message}")]
    Source { message: String },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// A record was routed to a category with no index.
    #[error("unknown category: {category}")]
    UnknownCategory { category: String },
}

/// A specialized Result type for Sieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;

impl SieveError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a file-too-large error.
    pub fn too_large(path: impl Into<PathBuf>, size: u64, max: u64) -> Self {
        Self::TooLarge {
            path: path.into(),
            size,
            max,
        }
    }

    /// Create a record source error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unknown category error.
    pub fn unknown_category(category: impl Into<String>) -> Self {
        Self::UnknownCategory {
            category: category.into(),
        }
    }

    /// Whether a later retry of the same operation could succeed.
    ///
    /// Source and storage failures are transient from the index's point of
    /// view; routing, size and parse errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Source { .. } | Self::Storage { .. })
    }
}

impl From<io::Error> for SieveError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error and return a safe default instead of propagating.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the Sieve CLI.
pub mod exit_codes {
    /// The command completed.
    pub const SUCCESS: i32 = 0;

    /// The command failed (bad input, unreachable corpus).
    pub const ERROR: i32 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = SieveError::storage(
            "/tmp/jobs.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/jobs.json"));
    }

    #[test]
    fn test_too_large_display() {
        let err = SieveError::too_large("/data/jobs.json", 1000, 500);
        assert_eq!(
            err.to_string(),
            "file /data/jobs.json is too large (1000 bytes, max 500 bytes)"
        );
    }

    #[test]
    fn test_source_error_display() {
        let err = SieveError::source("connection refused");
        assert_eq!(err.to_string(), "record source error: connection refused");
    }

    #[test]
    fn test_serde_error_display() {
        let err = SieveError::serde("invalid JSON");
        assert_eq!(err.to_string(), "serialization error: invalid JSON");
    }

    #[test]
    fn test_config_error_display() {
        let err = SieveError::config("invalid TOML");
        assert_eq!(err.to_string(), "config error: invalid TOML");
    }

    #[test]
    fn test_unknown_category_display() {
        let err = SieveError::unknown_category("resumes");
        assert_eq!(err.to_string(), "unknown category: resumes");
    }

    #[test]
    fn test_is_retryable() {
        assert!(SieveError::source("down").is_retryable());
        assert!(SieveError::from(io::Error::other("disk")).is_retryable());
        assert!(!SieveError::serde("bad").is_retryable());
        assert!(!SieveError::config("bad").is_retryable());
        assert!(!SieveError::unknown_category("x").is_retryable());
        assert!(!SieveError::too_large("/data/jobs.json", 10, 5).is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: SieveError = io_err.into();
        assert!(matches!(err, SieveError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: SieveError = json_err.into();
        assert!(matches!(err, SieveError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(SieveError::source("test"));
        let value = result.fail_open_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<i32> = Err(SieveError::source("test"));
        let value = result.fail_open_with("test context", 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<i32> = Ok(100);
        let value = result.fail_open_default("test context");
        assert_eq!(value, 100);
    }
}
