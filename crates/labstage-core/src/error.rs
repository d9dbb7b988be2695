//! Transport error type.
//!
//! Everything in this enum is fatal from a driver's point of view: the
//! command/response exchange could not complete, so there is no reply to
//! interpret. Drivers propagate these with `?` and never retry them.
//!
//! Protocol-level failures (a device answering "NG", a malformed reply) are
//! not transport errors and live in the driver crates.

use std::time::Duration;
use thiserror::Error;

/// Convenience alias for transport results.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Failure of the underlying line transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The port could not be opened.
    ///
    /// **Source**: wraps the serial backend's error text together with the
    /// device name and port path so the message is actionable on its own.
    #[error("Failed to open {device} serial port {port}: {message}")]
    Open {
        /// Human-readable device name (e.g. "SBIS26")
        device: String,
        /// Port path (e.g. "/dev/ttyUSB0")
        port: String,
        /// Backend error message
        message: String,
    },

    /// Read or write on an open port failed.
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete line arrived within the read timeout.
    #[error("Read timed out after {0:?} waiting for a response line")]
    Timeout(Duration),

    /// The peer closed the connection (EOF while waiting for a line).
    #[error("Transport disconnected")]
    Disconnected,
}

impl TransportError {
    /// Whether the error left the port in a usable state.
    ///
    /// After a timeout the port is still open, and a late reply is discarded
    /// before the next command goes out. Every other variant means the
    /// connection is gone.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}
