//! Error types and Result aliases for ckernel

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for ckernel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ckernel
///
/// Only launch failures escape an execution as `Err`. Compile failures,
/// non-zero exits and timeouts are folded into the
/// [`ExecutionResult`](crate::models::ExecutionResult) as diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Process errors ===
    /// The executable could not be spawned (missing, not executable, ...)
    #[error("Failed to launch '{command}': {reason}")]
    LaunchFailed { command: String, reason: String },

    /// Supervisor operation attempted in the wrong lifecycle state
    #[error("Supervisor for '{command}' is {state}, expected {expected}")]
    InvalidState {
        command: String,
        state: String,
        expected: String,
    },

    /// Failed to query the child's status
    #[error("Failed to wait on '{command}': {reason}")]
    WaitFailed { command: String, reason: String },

    /// Failed to send a signal to the child
    #[error("Failed to send signal '{signal}' to pid {pid}: {reason}")]
    SignalSendFailed {
        signal: String,
        pid: u32,
        reason: String,
    },

    /// Execution exceeded its deadline
    #[error("'{command}' timed out after {duration:?}")]
    Timeout { command: String, duration: Duration },

    // === Input errors ===
    /// The input provider could not produce a line
    #[error("No interactive input available: {reason}")]
    InputUnavailable { reason: String },

    /// The line could not be written to the child's stdin
    #[error("Failed to write input to child: {reason}")]
    InputWriteFailed { reason: String },

    // === Scratch space errors ===
    /// Failed to create or write a temporary file
    #[error("Scratch space error at '{}': {reason}", path.display())]
    ScratchSpaceFailed { path: PathBuf, reason: String },

    // === Configuration errors ===
    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Regex compilation errors
    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    #[error("Error: {0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts the current execution
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::LaunchFailed { .. } | Error::ScratchSpaceFailed { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
