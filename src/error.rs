//! Error types for ws2mpd
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type for ws2mpd operations
#[derive(Debug, Error)]
pub enum BridgeError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// The daemon sent something the decoder cannot make sense of
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<tungstenite::Error> for BridgeError {
    fn from(e: tungstenite::Error) -> Self {
        BridgeError::WebSocket(Box::new(e))
    }
}

impl BridgeError {
    /// True when the error only means the peer went away
    pub fn is_disconnect(&self) -> bool {
        match self {
            BridgeError::Io(e) => is_disconnect_kind(e.kind()),
            BridgeError::WebSocket(e) => match e.as_ref() {
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
                tungstenite::Error::Io(io) => is_disconnect_kind(io.kind()),
                _ => false,
            },
            _ => false,
        }
    }
}

fn is_disconnect_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}
