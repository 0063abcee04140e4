//! Error types for the I/O edge
use thiserror::Error;

/// Errors raised at the wire and socket edge
#[derive(Error, Debug)]
pub enum ControlError {
    /// OSC error
    #[error("OSC error: {0}")]
    OscError(String),

    /// DMX output error
    #[error("DMX error: {0}")]
    DmxError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid message format
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The render loop already stopped
    #[error("Orchestrator is not running")]
    NotRunning,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
