//! Error types for pwngrid-rs

use thiserror::Error;

/// Result type alias for pwngrid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pwngrid-rs
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (persistence, pcap files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Radio primitive failed (channel switch, transmit, promiscuous setup)
    #[error("Radio error: {0}")]
    Radio(String),

    /// Frame parsing error
    #[error("Frame parsing error: {0}")]
    FrameParsing(String),

    /// Frame construction error
    #[error("Frame construction error: {0}")]
    FrameConstruction(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Channel outside 1..=14
    #[error("Invalid channel: {0}")]
    InvalidChannel(u8),

    /// Fixed-capacity store is full
    #[error("Capacity exceeded: {capacity} entries")]
    CapacityExceeded { capacity: usize },

    /// Queue receiver is gone
    #[error("Queue closed: {0}")]
    QueueClosed(String),

    /// Persistence collaborator failure
    #[error("Store error: {0}")]
    Store(String),

    /// Capture source error
    #[error("Capture error: {0}")]
    Capture(String),

    /// Unknown attack id or similar lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Operation interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// Create a radio error with a custom message
    pub fn radio<S: Into<String>>(msg: S) -> Self {
        Error::Radio(msg.into())
    }

    /// Create a store error with a custom message
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
