//! Error types for mirreview.
//!
//! Library crates use [`ReviewError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all mirreview operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Structured data (snapshot JSON, config values) could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (unsupported file type, bad index, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Uploaded document is not valid UTF-8 text.
    #[error("could not decode {file_name} as UTF-8 text: {source}")]
    Decode {
        file_name: String,
        source: std::string::FromUtf8Error,
    },

    /// The external document converter is not installed or not on `PATH`.
    #[error("document converter `{tool}` not found; install it or set [converter].command")]
    ConverterUnavailable { tool: String },

    /// The converter ran but rejected the input.
    #[error("document conversion failed: {diagnostic}")]
    ConversionFailed { diagnostic: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// CSV or markdown export error.
    #[error("export error: {0}")]
    Export(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReviewError>;

impl ReviewError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Create a conversion failure carrying the converter's diagnostic text.
    pub fn conversion(diagnostic: impl Into<String>) -> Self {
        Self::ConversionFailed {
            diagnostic: diagnostic.into(),
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
