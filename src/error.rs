//! Error handling for the WatchVis application
//!
//! This module defines custom error types and a Result alias for use
//! throughout the application.

use thiserror::Error;

/// Main error type for WatchVis operations
#[derive(Error, Debug)]
pub enum WatchVisError {
    /// Errors related to the control-channel wire format
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication with the host
    #[error("Channel error: {0}")]
    Channel(String),

    /// Errors related to buffer decoding
    #[error("Decode error: {0}")]
    Decode(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WatchVisError>,
    },
}

impl WatchVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WatchVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for WatchVis operations
pub type Result<T> = std::result::Result<T, WatchVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
