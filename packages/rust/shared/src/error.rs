//! Error types for coursegeo.
//!
//! Library crates use [`CourseGeoError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all coursegeo operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseGeoError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input dataset missing or unreadable. Fatal before any network call.
    #[error("failed to load dataset {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    /// Output destination unwritable. Fatal after enrichment.
    #[error("failed to write {path:?}: {message}")]
    Write { path: PathBuf, message: String },

    /// A single geocoding request failed. Contained per row by the resolver.
    #[error("geocode error: {0}")]
    Geocode(String),

    /// Network/HTTP error while fetching source data.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed payload (JSON, CSV, spreadsheet).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing column, bad row index, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseGeoError>;

impl CourseGeoError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a load error for `path`.
    pub fn load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a write error for `path`.
    pub fn write(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
