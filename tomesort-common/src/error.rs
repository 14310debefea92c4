//! Common error types for the tomesort tools

use std::path::PathBuf;

use thiserror::Error;

/// Common result type for tomesort operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tomesort tools
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record file could not be decoded
    #[error("Invalid JSON in {path}: {message}")]
    Json { path: PathBuf, message: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required root directory is absent; fatal before any processing
    #[error("Environment error: {0}")]
    Environment(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
