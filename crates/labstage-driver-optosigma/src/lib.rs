//! OptoSigma hardware drivers for labstage.
//!
//! This crate drives the **SBIS26** multi-axis motorized stage controller over
//! its ASCII serial protocol:
//! - [`Sbis26`]: the controller (initialization, device count, raw reads)
//! - [`Axis`]: one of its three axes (home, move, relative move, speed, status)
//! - [`protocol`]: command rendering and typed reply parsing
//! - [`ack`]: the four-field acknowledgement taxonomy
//!
//! # Usage
//!
//! ```rust,ignore
//! use labstage_driver_optosigma::{Sbis26, Sbis26Config};
//!
//! let stage = Sbis26::connect(&Sbis26Config::new("/dev/ttyUSB0")).await?;
//! let axis = stage.axis(1)?;
//! axis.home().await?;
//! let reply = axis.move_to(10_000).await?;
//! if reply.is_not_good() {
//!     eprintln!("controller said NG: {reply}");
//! }
//! ```

pub mod ack;
pub mod axis;
pub mod error;
pub mod observer;
pub mod protocol;
pub mod reply;
pub mod sbis26;
mod session;

pub use ack::{AxisFault, AxisReport, AxisState};
pub use axis::{Axis, PollSettings, ReadyOutcome};
pub use error::{ParseError, StageError, StageResult};
pub use observer::{NullObserver, StageObserver, TracingObserver};
pub use protocol::{SpeedProfile, StatusToken, POSITION_MAX, POSITION_MIN};
pub use reply::Reply;
pub use sbis26::{Sbis26, Sbis26Config, Sbis26Factory};
