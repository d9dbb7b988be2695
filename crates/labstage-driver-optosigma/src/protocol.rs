//! SBIS26 wire protocol.
//!
//! Reference: OptoSigma SBIS26 controller command manual.
//!
//! Protocol Overview:
//! - Format: ASCII command/response over RS-232
//! - Baud: 38400, 8N1, no flow control, `\r\n` line terminator
//! - Commands: `<OP>:<scope>,<axis>[,<args>]` with scope `D` (one axis),
//!   `B` (batch) or `A` (all axes)
//! - Example: `A:D,2,+5000` (axis 2, absolute move to +5000 pulses)
//!
//! [`Command`] renders outgoing lines. The reply types parse incoming lines
//! into typed records and fail with [`ParseError`] on anything malformed.

use crate::error::ParseError;
use std::fmt;

/// Lowest commandable position, in pulses.
pub const POSITION_MIN: i64 = -134_217_728;

/// Highest commandable position, in pulses.
pub const POSITION_MAX: i64 = 134_217_727;

/// Number of axes on the controller.
pub const AXIS_COUNT: u8 = 3;

/// Profile applied to every axis when a stage is opened.
pub const DEFAULT_SPEED_PROFILE: SpeedProfile = SpeedProfile {
    speed: 200_000,
    range: 200_000,
    acceleration: 100,
};

/// Saturate `position` into `[POSITION_MIN, POSITION_MAX]`.
pub fn clamp_position(position: i64) -> i64 {
    position.clamp(POSITION_MIN, POSITION_MAX)
}

/// Speed, speed range and acceleration time of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedProfile {
    speed: u64,
    range: u64,
    acceleration: u64,
}

impl SpeedProfile {
    /// Build a profile, or `None` if any component is zero or negative.
    pub fn new(speed: i64, range: i64, acceleration: i64) -> Option<Self> {
        let positive = |v: i64| u64::try_from(v).ok().filter(|v| *v > 0);
        Some(Self {
            speed: positive(speed)?,
            range: positive(range)?,
            acceleration: positive(acceleration)?,
        })
    }

    /// Speed in pulses/s.
    pub fn speed(&self) -> u64 {
        self.speed
    }

    /// Speed range setting.
    pub fn range(&self) -> u64 {
        self.range
    }

    /// Acceleration time.
    pub fn acceleration(&self) -> u64 {
        self.acceleration
    }

    /// Parse the trailing three fields of a speed query reply.
    pub fn parse_reply(raw: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(ParseError::new(
                "speed",
                raw,
                format!("expected at least 3 fields, got {}", fields.len()),
            ));
        }
        let tail = &fields[fields.len() - 3..];
        let mut values = [0i64; 3];
        for (slot, field) in values.iter_mut().zip(tail) {
            *slot = field
                .parse()
                .map_err(|_| ParseError::new("speed", raw, format!("{field:?} is not an integer")))?;
        }
        Self::new(values[0], values[1], values[2])
            .ok_or_else(|| ParseError::new("speed", raw, "components must be positive"))
    }
}

/// Every command the driver sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `H:D,<axis>`
    Home { axis: u8 },
    /// `D:D,<axis>,+<speed>,<range>,<accel>`
    SetSpeed { axis: u8, profile: SpeedProfile },
    /// `D:B,1,<s>,<r>,<a>,2,...,3,...`
    SetSpeedAll { profiles: [SpeedProfile; 3] },
    /// `?:D,<axis>,D`
    QuerySpeed { axis: u8 },
    /// `SRQ:D,<axis>`
    Status { axis: u8 },
    /// `A:D,<axis>,<±pos>`; the position is clamped when rendered
    MoveAbsolute { axis: u8, position: i64 },
    /// `M:D,<axis>,<±delta>`
    MoveRelative { axis: u8, delta: i64 },
    /// `Q:D,<axis>`
    QueryPosition { axis: u8 },
    /// `LE:A`, stops every axis
    StopAll,
    /// `CONNECT?`
    CountDevices,
    /// `#CONNECT:`
    Connect,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Command::Home { axis } => write!(f, "H:D,{axis}"),
            Command::SetSpeed { axis, profile } => write!(
                f,
                "D:D,{axis},+{},{},{}",
                profile.speed, profile.range, profile.acceleration
            ),
            Command::SetSpeedAll { profiles } => {
                f.write_str("D:B")?;
                for (axis, p) in (1..=AXIS_COUNT).zip(profiles.iter()) {
                    write!(f, ",{axis},{},{},{}", p.speed, p.range, p.acceleration)?;
                }
                Ok(())
            }
            Command::QuerySpeed { axis } => write!(f, "?:D,{axis},D"),
            Command::Status { axis } => write!(f, "SRQ:D,{axis}"),
            Command::MoveAbsolute { axis, position } => {
                write!(f, "A:D,{axis},{:+}", clamp_position(position))
            }
            Command::MoveRelative { axis, delta } => write!(f, "M:D,{axis},{delta:+}"),
            Command::QueryPosition { axis } => write!(f, "Q:D,{axis}"),
            Command::StopAll => f.write_str("LE:A"),
            Command::CountDevices => f.write_str("CONNECT?"),
            Command::Connect => f.write_str("#CONNECT:"),
        }
    }
}

/// Pick the command for a relative move of `delta` from `current`.
///
/// The prospective target is `current - delta`. If it lies inside the
/// travel range the relative command goes out unchanged; otherwise the axis
/// is sent to the bound nearest that target with an absolute move.
pub fn plan_relative_move(axis: u8, current: i64, delta: i64) -> Command {
    let target = i128::from(current) - i128::from(delta);
    if target < i128::from(POSITION_MIN) {
        Command::MoveAbsolute {
            axis,
            position: POSITION_MIN,
        }
    } else if target > i128::from(POSITION_MAX) {
        Command::MoveAbsolute {
            axis,
            position: POSITION_MAX,
        }
    } else {
        Command::MoveRelative { axis, delta }
    }
}

/// The status letter at the end of an `SRQ` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusToken {
    /// `B`
    Busy,
    /// `R`
    Ready,
    /// Anything else the controller reported.
    Other(String),
}

impl StatusToken {
    /// Parse the last comma field of a status reply.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let last = raw.rsplit(',').next().map(str::trim).unwrap_or_default();
        match last {
            "" => Err(ParseError::new("status", raw, "empty status field")),
            "B" => Ok(Self::Busy),
            "R" => Ok(Self::Ready),
            other => Ok(Self::Other(other.to_string())),
        }
    }

    /// `true` for `R`.
    pub fn is_ready(&self) -> bool {
        matches!(self, StatusToken::Ready)
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        match self {
            StatusToken::Busy => "B",
            StatusToken::Ready => "R",
            StatusToken::Other(s) => s,
        }
    }
}

impl fmt::Display for StatusToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the position out of a `Q:D` reply (third comma field).
pub fn parse_position(raw: &str) -> Result<i64, ParseError> {
    let field = raw
        .split(',')
        .nth(2)
        .map(str::trim)
        .ok_or_else(|| ParseError::new("position", raw, "missing third field"))?;
    field
        .parse()
        .map_err(|_| ParseError::new("position", raw, format!("{field:?} is not an integer")))
}

/// Parse a `CONNECT?` reply into a device count.
pub fn parse_device_count(raw: &str) -> Result<u32, ParseError> {
    raw.trim()
        .parse()
        .map_err(|_| ParseError::new("device count", raw, "not a non-negative integer"))
}
