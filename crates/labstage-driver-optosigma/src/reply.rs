//! Tagged command replies.
//!
//! The controller signals a rejected command by ending its reply with `NG`.
//! That is not raised as an error: the raw text always reaches the caller.
//! [`Reply`] tags it so the outcome can be checked without string
//! inspection, and [`Reply::into_strict`] turns it into an error for callers
//! that want one.

use crate::error::{StageError, StageResult};
use std::fmt;

/// Trailing token of a rejected command.
pub const NOT_GOOD: &str = "NG";

/// One reply line, tagged by outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Anything not ending in `NG`.
    Ok(String),
    /// The controller (or local validation) said "not good".
    SoftFailure(String),
}

impl Reply {
    /// Tag a raw line by its trailing comma token.
    pub fn from_line(line: impl Into<String>) -> Self {
        let line = line.into();
        let trailing = line.rsplit(',').next().map(str::trim);
        if trailing == Some(NOT_GOOD) {
            Reply::SoftFailure(line)
        } else {
            Reply::Ok(line)
        }
    }

    /// The sentinel returned when input is rejected before sending.
    pub fn rejected() -> Self {
        Reply::SoftFailure(NOT_GOOD.to_string())
    }

    /// Raw reply text.
    pub fn as_str(&self) -> &str {
        match self {
            Reply::Ok(s) | Reply::SoftFailure(s) => s,
        }
    }

    /// `true` unless the reply is a soft failure.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    /// `true` for `NG` replies and local rejections.
    pub fn is_not_good(&self) -> bool {
        !self.is_ok()
    }

    /// Raw reply text, consuming the reply.
    pub fn into_string(self) -> String {
        match self {
            Reply::Ok(s) | Reply::SoftFailure(s) => s,
        }
    }

    /// Strict handling: soft failures become [`StageError::NotGood`].
    pub fn into_strict(self) -> StageResult<String> {
        match self {
            Reply::Ok(s) => Ok(s),
            Reply::SoftFailure(s) => Err(StageError::NotGood(s)),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Reply {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
