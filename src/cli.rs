//! Command-line interface.
//!
//! Each subcommand maps onto one stage or axis operation. The controller's
//! reply is printed as-is; an `NG` reply is printed with a marker and does
//! not make the command fail. Only transport, parse and configuration
//! errors do.

use crate::config::Overrides;
use clap::{Parser, Subcommand};
use labstage_driver_optosigma::{Reply, Sbis26, StageResult};
use std::path::PathBuf;

/// Parsed command line.
#[derive(Parser, Debug)]
#[command(name = "labstage")]
#[command(version, about = "Control an OptoSigma SBIS26 motorized stage", long_about = None)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port, overriding the settings file
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Baud rate, overriding the settings file
    #[arg(long, global = true)]
    pub baud: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// One stage operation.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Number of devices attached to the controller
    Count,
    /// Handshake with the controller
    Init,
    /// Send an axis to its origin
    Home {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
    },
    /// Absolute move (pulses); out-of-range targets saturate
    Move {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
        /// Target position
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },
    /// Relative move (pulses)
    MoveRel {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
        /// Distance to move
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Status letter (B = busy, R = ready)
    Status {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
    },
    /// Decoded acknowledgement fields and axis state
    Report {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
    },
    /// Current position (pulses)
    Position {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
    },
    /// Set speed, speed range and acceleration time
    Speed {
        /// Axis number (1-3)
        #[arg(value_parser = axis_number)]
        axis: u8,
        /// Speed (pulses/s)
        #[arg(allow_negative_numbers = true)]
        speed: i64,
        /// Speed range
        #[arg(allow_negative_numbers = true)]
        range: i64,
        /// Acceleration time
        #[arg(allow_negative_numbers = true)]
        acceleration: i64,
    },
    /// Stop all axes
    Stop,
}

fn axis_number(s: &str) -> Result<u8, String> {
    match s.parse::<u8>() {
        Ok(n @ 1..=3) => Ok(n),
        _ => Err(format!("axis must be 1, 2 or 3, got {s:?}")),
    }
}

impl Cli {
    /// Values that override the loaded settings.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            log_level: self.log_level.clone(),
        }
    }
}

/// Run `command` against `stage` and return the text to print.
pub async fn execute(stage: &Sbis26, command: &Command) -> StageResult<String> {
    let out = match *command {
        Command::Count => stage.count_devices().await?.to_string(),
        Command::Init => render(stage.initialize().await?),
        Command::Home { axis } => render(stage.axis(axis)?.home().await?),
        Command::Move { axis, position } => render(stage.axis(axis)?.move_to(position).await?),
        Command::MoveRel { axis, delta } => render(stage.axis(axis)?.move_relative(delta).await?),
        Command::Status { axis } => stage.axis(axis)?.status().await?.to_string(),
        Command::Report { axis } => {
            let report = stage.axis(axis)?.report().await?;
            format!("{report} ({:?})", report.state())
        }
        Command::Position { axis } => stage.axis(axis)?.position().await?.to_string(),
        Command::Speed {
            axis,
            speed,
            range,
            acceleration,
        } => render(stage.axis(axis)?.set_speed(speed, range, acceleration).await?),
        // any axis handle issues the broadcast stop
        Command::Stop => render(stage.axis(1)?.stop().await?),
    };
    Ok(out)
}

fn render(reply: Reply) -> String {
    match reply {
        Reply::Ok(raw) => raw,
        Reply::SoftFailure(raw) => format!("{raw} [NG]"),
    }
}
