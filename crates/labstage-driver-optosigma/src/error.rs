//! SBIS26 driver errors.
//!
//! Three kinds of failure are kept apart:
//!
//! - **Transport** (`StageError::Transport`): the line could not be written or
//!   read. Fatal, propagated immediately, never retried.
//! - **Protocol** (`StageError::Parse`, `StageError::NotGood`, `StageError::Fault`):
//!   a reply arrived but is malformed or reports a problem. Malformed replies
//!   are always errors. "NG" replies and faulted status reports only become
//!   errors when the caller opts in through [`Reply::into_strict`](crate::Reply::into_strict)
//!   or [`AxisReport::into_result`](crate::ack::AxisReport::into_result).
//! - **Local** (`StageError::InvalidAxis`, `StageError::Config`): caught before
//!   anything is sent.

use crate::ack::AxisFault;
use labstage_core::TransportError;
use thiserror::Error;

/// Convenience alias for driver results.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// A reply that does not match the shape its command family promises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed {family} reply {raw:?}: {reason}")]
pub struct ParseError {
    /// Which reply family was being parsed ("position", "status", ...).
    pub family: &'static str,
    /// The raw reply text.
    pub raw: String,
    /// What was wrong with it.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(family: &'static str, raw: &str, reason: impl Into<String>) -> Self {
        Self {
            family,
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the SBIS26 driver.
#[derive(Error, Debug)]
pub enum StageError {
    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A reply could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The controller answered "NG" (strict handling only).
    #[error("SBIS26 rejected the command: {0:?}")]
    NotGood(String),

    /// A status report shows a limit stop, alarm or command error.
    #[error(transparent)]
    Fault(#[from] AxisFault),

    /// Axis numbers run 1 to 3.
    #[error("SBIS26 axis must be 1-3, got {0}")]
    InvalidAxis(u8),

    /// Configuration rejected before connecting.
    #[error("Invalid SBIS26 config: {0}")]
    Config(String),
}

impl StageError {
    /// Whether this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, StageError::Transport(_))
    }
}
