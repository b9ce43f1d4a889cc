//! Error types for numlab-trainer
//!
//! Adapters return these; the session controller, renderer and feedback
//! synthesizer catch them at the call site and degrade instead of propagating.

use thiserror::Error;

/// Main error type for the trainer
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No audio output device (or audio disabled)
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Speech engine errors
    #[error("Speech error: {0}")]
    Speech(String),

    /// Task answer does not match its kind's grammar
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// Score storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the common library
    #[error(transparent)]
    Common(#[from] numlab_common::Error),
}

/// Convenience Result type using the trainer Error
pub type Result<T> = std::result::Result<T, Error>;
