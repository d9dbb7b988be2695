//! SBIS26 acknowledgement codes.
//!
//! A status request (`SRQ:D,<ch>`) ends in four single-letter codes:
//!
//! | Field | Codes |
//! |-------|-------|
//! | ack1  | `X` command error, `K` command accepted |
//! | ack2  | `C` clockwise limit, `W` counter-clockwise limit, `E` both limits, `K` normal stop |
//! | ack3  | `K` no alarm, `E` hardware alarm, `C` communication alarm |
//! | ack4  | `B` busy, `R` ready |
//!
//! [`AxisReport`] decodes them and classifies the axis into an [`AxisState`].
//! [`AxisFault`] is the error form of a report that is not clean.

use crate::error::ParseError;
use std::fmt;
use thiserror::Error;

/// ack1: did the controller accept the last command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAck {
    /// `X`
    CommandError,
    /// `K`
    CommandAccepted,
}

/// ack2: how the last motion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// `C`
    StoppedByClockwiseLimit,
    /// `W`
    StoppedByCounterClockwiseLimit,
    /// `E`
    StoppedByBothLimits,
    /// `K`
    NormalStop,
}

/// ack3: alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// `K`
    NoAlarm,
    /// `E`
    HardwareAlarm,
    /// `C`
    CommunicationAlarm,
}

/// ack4: motion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// `B`
    Busy,
    /// `R`
    Ready,
}

impl CommandAck {
    /// Decode an ack1 letter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "X" => Some(Self::CommandError),
            "K" => Some(Self::CommandAccepted),
            _ => None,
        }
    }

    /// Controller manual wording.
    pub fn message(self) -> &'static str {
        match self {
            Self::CommandError => "Error of command",
            Self::CommandAccepted => "Command received normally",
        }
    }
}

impl StopCondition {
    /// Decode an ack2 letter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(Self::StoppedByClockwiseLimit),
            "W" => Some(Self::StoppedByCounterClockwiseLimit),
            "E" => Some(Self::StoppedByBothLimits),
            "K" => Some(Self::NormalStop),
            _ => None,
        }
    }

    /// Controller manual wording.
    pub fn message(self) -> &'static str {
        match self {
            Self::StoppedByClockwiseLimit => "Stopped by clockwise limit sensor detected",
            Self::StoppedByCounterClockwiseLimit => {
                "Stopped by counter-clockwise limit sensor detected"
            }
            Self::StoppedByBothLimits => "Stopped by both of limit sensors detected",
            Self::NormalStop => "Normal stop",
        }
    }
}

impl AlarmState {
    /// Decode an ack3 letter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "K" => Some(Self::NoAlarm),
            "E" => Some(Self::HardwareAlarm),
            "C" => Some(Self::CommunicationAlarm),
            _ => None,
        }
    }

    /// Controller manual wording.
    pub fn message(self) -> &'static str {
        match self {
            Self::NoAlarm => "No alarm",
            Self::HardwareAlarm => "Alarm on the hardware",
            Self::CommunicationAlarm => "Alarm on the communication",
        }
    }
}

impl Readiness {
    /// Decode an ack4 letter.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Self::Busy),
            "R" => Some(Self::Ready),
            _ => None,
        }
    }

    /// Controller manual wording.
    pub fn message(self) -> &'static str {
        match self {
            Self::Busy => "Busy",
            Self::Ready => "Ready",
        }
    }
}

/// Coarse axis state derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisState {
    /// Idle, last command fine.
    Ready,
    /// Motion in progress.
    Busy,
    /// Halted on the clockwise limit sensor.
    LimitCw,
    /// Halted on the counter-clockwise limit sensor.
    LimitCcw,
    /// Both limit sensors active.
    LimitBoth,
    /// Hardware alarm raised.
    HardwareAlarm,
    /// Communication alarm raised.
    CommunicationAlarm,
    /// Controller rejected the last command.
    CommandError,
}

impl AxisState {
    /// Whether the axis can take a new motion command without intervention.
    pub fn is_operational(self) -> bool {
        matches!(self, AxisState::Ready | AxisState::Busy)
    }
}

/// Decoded ack1..ack4 of one status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReport {
    /// ack1
    pub command: CommandAck,
    /// ack2
    pub stop: StopCondition,
    /// ack3
    pub alarm: AlarmState,
    /// ack4
    pub readiness: Readiness,
}

impl AxisReport {
    /// Decode the last four comma fields of an `SRQ` reply.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() < 4 {
            return Err(ParseError::new(
                "status report",
                raw,
                format!("expected at least 4 fields, got {}", fields.len()),
            ));
        }
        let codes = &fields[fields.len() - 4..];
        let bad = |field: &str, code: &str| {
            ParseError::new("status report", raw, format!("unknown {field} code {code:?}"))
        };

        Ok(Self {
            command: CommandAck::from_code(codes[0]).ok_or_else(|| bad("ack1", codes[0]))?,
            stop: StopCondition::from_code(codes[1]).ok_or_else(|| bad("ack2", codes[1]))?,
            alarm: AlarmState::from_code(codes[2]).ok_or_else(|| bad("ack3", codes[2]))?,
            readiness: Readiness::from_code(codes[3]).ok_or_else(|| bad("ack4", codes[3]))?,
        })
    }

    /// Classify the report.
    ///
    /// A command error outranks alarms, alarms outrank limit stops, and only
    /// a clean report falls through to busy/ready.
    pub fn state(&self) -> AxisState {
        if self.command == CommandAck::CommandError {
            return AxisState::CommandError;
        }
        match self.alarm {
            AlarmState::HardwareAlarm => return AxisState::HardwareAlarm,
            AlarmState::CommunicationAlarm => return AxisState::CommunicationAlarm,
            AlarmState::NoAlarm => {}
        }
        match self.stop {
            StopCondition::StoppedByClockwiseLimit => AxisState::LimitCw,
            StopCondition::StoppedByCounterClockwiseLimit => AxisState::LimitCcw,
            StopCondition::StoppedByBothLimits => AxisState::LimitBoth,
            StopCondition::NormalStop => match self.readiness {
                Readiness::Busy => AxisState::Busy,
                Readiness::Ready => AxisState::Ready,
            },
        }
    }

    /// `Err(AxisFault)` unless the axis is simply busy or ready.
    pub fn into_result(self) -> Result<Self, AxisFault> {
        if self.state().is_operational() {
            Ok(self)
        } else {
            Err(AxisFault { report: self })
        }
    }
}

impl fmt::Display for AxisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.command.message(),
            self.stop.message(),
            self.alarm.message(),
            self.readiness.message()
        )
    }
}

/// A status report showing a limit stop, an alarm or a command error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("OptoSigma SBIS26 Error: {report}")]
pub struct AxisFault {
    /// The report that triggered the fault.
    pub report: AxisReport,
}

impl AxisFault {
    /// Classified state of the faulted axis.
    pub fn state(&self) -> AxisState {
        self.report.state()
    }
}
