//! Error types for a sheet update run

use thiserror::Error;

/// Failures that end or degrade a run.
///
/// Keys missing from the mapping are not errors; they are recorded as misses.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required configuration or file is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// OAuth token is missing, expired without a refresh token, or was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Reading the row range from the sheet failed
    #[error("Failed to read range {range}: {message}")]
    RemoteRead { range: String, message: String },

    /// Applying the batched cell updates failed
    #[error("Failed to write {cells} cells: {message}")]
    RemoteWrite { cells: usize, message: String },
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RemoteWrite { .. } => 2,
            _ => 1,
        }
    }
}
