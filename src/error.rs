use thiserror::Error;

/// Unified error type for release-sync operations.
///
/// Every variant here is fatal for the run. Soft failures that must never
/// abort a release are modeled separately as [`crate::advisory::Advisory`].
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Hosted release error: {0}")]
    Release(String),

    #[error("Invalid whitelist pattern: {0}")]
    Whitelist(#[from] regex::Error),

    #[error("Settings parse error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-sync
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        SyncError::Config(msg.into())
    }

    /// Create a precondition error (wrong directory, wrong branch, placeholder identity)
    pub fn precondition(msg: impl Into<String>) -> Self {
        SyncError::Precondition(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        SyncError::Version(msg.into())
    }

    /// Create an external command failure
    pub fn command(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        SyncError::Command {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a hosted release error with context
    pub fn release(msg: impl Into<String>) -> Self {
        SyncError::Release(msg.into())
    }
}
