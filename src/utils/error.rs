//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Reconstruction itself never returns an error: corrupt buffers abort to an
//! empty result and are reported through the log.

use thiserror::Error;

/// Errors that can occur while loading a raw event buffer
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read buffer: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid buffer format: {0}")]
    InvalidFormat(String),

    #[error("Binary buffer length {0} is not a multiple of 8 bytes")]
    Misaligned(usize),
}

/// Errors that can occur while loading a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
