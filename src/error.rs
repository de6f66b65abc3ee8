//! Error types for rconkit
//!
//! Provides a unified error type for codec, connection, and executor
//! operations. Only the executor turns these into `"Error: ..."` strings.

use thiserror::Error;

use crate::network::ConnectionState;

/// Result type alias using RconError
pub type Result<T> = std::result::Result<T, RconError>;

/// Unified error type for rconkit operations
#[derive(Debug, Error)]
pub enum RconError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Connection to {addr} timed out")]
    ConnectTimeout { addr: String },

    #[error("Connection to {addr} refused")]
    ConnectionRefused { addr: String },

    #[error("Connection is not ready (state: {0:?})")]
    NotConnected(ConnectionState),

    // -------------------------------------------------------------------------
    // Authentication Errors
    // -------------------------------------------------------------------------
    #[error("Authentication failed - invalid password")]
    AuthenticationFailed,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Command timed out")]
    CommandTimeout,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RconError {
    /// True for failures of an established session's transport: the socket
    /// broke, a packet was malformed, or the round trip timed out.
    ///
    /// These are the only errors the shared-connection mode reconnects on.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RconError::Io(_) | RconError::Protocol(_) | RconError::CommandTimeout
        )
    }

    /// True if this is an I/O error caused by a socket timeout
    pub fn is_io_timeout(&self) -> bool {
        match self {
            RconError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
