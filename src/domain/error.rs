//! Error types for the notesync coordinator.
//!
//! This module defines the centralized error type [`NotesyncError`] and a type alias
//! [`Result`] used throughout the crate. Errors are implemented with `thiserror`.
//!
//! Very little inside the coordinator core is allowed to fail outward: bucket fetch
//! failures, malformed commands and unknown events all degrade to "state unchanged".
//! The error type exists for the edges (configuration loading, bucket implementations,
//! and the host shim's I/O).

use thiserror::Error;

/// The main error type for notesync operations.
///
/// # Examples
///
/// ```
/// use notesync::NotesyncError;
///
/// fn lookup() -> Result<(), NotesyncError> {
///     Err(NotesyncError::NotFound("note-1".to_string()))
/// }
/// assert!(lookup().is_err());
/// ```
#[derive(Debug, Error)]
pub enum NotesyncError {
    /// A bucket operation failed.
    ///
    /// The string describes which bucket operation failed and why.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record was requested from a bucket but does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host command could not be decoded.
    #[error("Command error: {0}")]
    Command(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A TOML configuration file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A specialized `Result` type for notesync operations.
pub type Result<T> = std::result::Result<T, NotesyncError>;
